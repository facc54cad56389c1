//! End-to-end question answering: condense -> retrieve -> assemble -> answer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::context::{AssembledContext, ContextAssembler};
use super::entity_extractor::EntityExtractor;
use super::graph::{GraphNeighborhoodCollector, StructuredContext};
use super::history::{ConversationTurn, HistoryCondenser};
use super::store::{GraphStore, StructuredExtractionModel, TextGenerationModel, VectorSearch};
use crate::config::RetrievalLimits;
use crate::metrics;
use crate::prompts::Prompt;
use crate::{Error, Result};

/// Collaborator handles for one pipeline instance.
#[derive(Clone)]
pub struct PipelineDeps {
    pub graph: Arc<dyn GraphStore>,
    pub vectors: Arc<dyn VectorSearch>,
    pub extraction_model: Arc<dyn StructuredExtractionModel>,
    pub condense_model: Arc<dyn TextGenerationModel>,
    pub answer_model: Arc<dyn TextGenerationModel>,
}

impl PipelineDeps {
    /// Use one language model for extraction, condensation and answers.
    pub fn with_llm<M>(graph: Arc<dyn GraphStore>, vectors: Arc<dyn VectorSearch>, llm: Arc<M>) -> Self
    where
        M: StructuredExtractionModel + TextGenerationModel + 'static,
    {
        Self {
            graph,
            vectors,
            extraction_model: llm.clone(),
            condense_model: llm.clone(),
            answer_model: llm,
        }
    }
}

/// Stage that failed but did not stop the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Follow-up rewrite failed; the raw question was used.
    Condensation,
    /// Graph path failed; only passages were used.
    GraphRetrieval,
    /// Similarity search failed; only graph lines were used.
    VectorRetrieval,
}

impl Degradation {
    fn metric_label(self) -> &'static str {
        match self {
            Degradation::Condensation => "condensation",
            Degradation::GraphRetrieval => "graph",
            Degradation::VectorRetrieval => "vector",
        }
    }
}

/// Answer plus what was used to produce it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub standalone_question: String,
    pub context: AssembledContext,
    pub degraded: Vec<Degradation>,
}

/// Composes the condenser, both retrieval paths and the answer model.
#[derive(Clone)]
pub struct AnswerPipeline {
    condenser: HistoryCondenser,
    extractor: EntityExtractor,
    collector: GraphNeighborhoodCollector,
    vectors: Arc<dyn VectorSearch>,
    assembler: ContextAssembler,
    answer_model: Arc<dyn TextGenerationModel>,
}

impl std::fmt::Debug for AnswerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerPipeline")
            .field("collector", &self.collector)
            .finish_non_exhaustive()
    }
}

impl AnswerPipeline {
    pub fn new(deps: PipelineDeps, limits: RetrievalLimits) -> Self {
        Self {
            condenser: HistoryCondenser::new(deps.condense_model),
            extractor: EntityExtractor::new(deps.extraction_model),
            collector: GraphNeighborhoodCollector::new(deps.graph, limits),
            vectors: deps.vectors,
            assembler: ContextAssembler::new(),
            answer_model: deps.answer_model,
        }
    }

    /// Answer `question` in the context of `history`, returning only the text.
    pub async fn answer(&self, question: &str, history: &[ConversationTurn]) -> Result<String> {
        self.answer_with_context(question, history)
            .await
            .map(|answer| answer.text)
    }

    /// Answer and report the standalone question, context and degradations.
    pub async fn answer_with_context(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(Error::InvalidArgument("question is empty".to_string()));
        }

        let started = Instant::now();
        metrics::record_pipeline_start();
        let result = self.run(question, history).await;
        metrics::record_pipeline_result(started.elapsed(), result.is_ok());

        if let Ok(answer) = &result {
            for stage in &answer.degraded {
                metrics::record_degraded(stage.metric_label());
            }
            info!(
                "Answered in {:.2}s (degraded: {:?})",
                started.elapsed().as_secs_f64(),
                answer.degraded
            );
        }
        result
    }

    async fn run(&self, question: &str, history: &[ConversationTurn]) -> Result<Answer> {
        let mut degraded = Vec::new();

        let stage = Instant::now();
        let standalone = match self.condenser.condense(question, history).await {
            Ok(standalone) => standalone,
            Err(err) => {
                warn!("Falling back to the raw question: {}", err);
                degraded.push(Degradation::Condensation);
                question.to_string()
            }
        };
        metrics::record_stage("condense", stage.elapsed());
        info!("Search query: {}", standalone);

        let (context, retrieval_degraded) = self.retrieve(&standalone).await?;
        degraded.extend(retrieval_degraded);

        let stage = Instant::now();
        let prompt = Prompt::Answer.render(&[
            ("context", context.as_str()),
            ("question", standalone.as_str()),
        ]);
        let text = self
            .answer_model
            .generate(&prompt)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        metrics::record_stage("generate", stage.elapsed());

        Ok(Answer {
            text,
            standalone_question: standalone,
            context,
            degraded,
        })
    }

    /// Run graph and vector retrieval concurrently and assemble the context.
    ///
    /// One failing path is tolerated; both failing is [`Error::Retrieval`].
    /// A fatal graph error (missing index) is returned regardless.
    pub async fn retrieve(&self, standalone: &str) -> Result<(AssembledContext, Vec<Degradation>)> {
        let stage = Instant::now();
        let (structured, unstructured) = tokio::join!(
            self.structured_retrieval(standalone),
            self.unstructured_retrieval(standalone),
        );
        metrics::record_stage("retrieve", stage.elapsed());

        let mut degraded = Vec::new();
        let (structured, unstructured) = match (structured, unstructured) {
            (Err(err), _) if err.is_fatal() => return Err(err),
            (Ok(structured), Ok(unstructured)) => (structured, unstructured),
            (Err(graph_err), Ok(unstructured)) => {
                warn!("Graph retrieval failed, using passages only: {}", graph_err);
                degraded.push(Degradation::GraphRetrieval);
                (StructuredContext::default(), unstructured)
            }
            (Ok(structured), Err(vector_err)) => {
                warn!("Similarity search failed, using graph only: {}", vector_err);
                degraded.push(Degradation::VectorRetrieval);
                (structured, Vec::new())
            }
            (Err(graph_err), Err(vector_err)) => {
                return Err(Error::Retrieval(format!(
                    "graph: {graph_err}; vector: {vector_err}"
                )));
            }
        };

        debug!(
            "Retrieved {} relationship lines and {} passages",
            structured.len(),
            unstructured.len()
        );
        Ok((self.assembler.assemble(&structured, &unstructured), degraded))
    }

    async fn structured_retrieval(&self, question: &str) -> Result<StructuredContext> {
        let entities = self.extractor.extract(question).await?;
        self.collector.collect(&entities).await
    }

    async fn unstructured_retrieval(&self, question: &str) -> Result<Vec<String>> {
        self.vectors.similarity_search(question).await
    }
}
