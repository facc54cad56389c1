mod test_ask;
mod test_fixture;
