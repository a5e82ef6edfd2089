use anyhow::{Context, Result};
use async_trait::async_trait;
use net_runner::{NetRunner, Query};
use rand::Rng;
use sha2::{Digest, Sha256};
use teloxide::requests::{Request, Requester};
use teloxide::types::{
    InlineQueryResult, InlineQueryResultArticle, InputMessageContent, InputMessageContentText,
    MessageEntity, MessageEntityKind,
};

pub const DEFAULT_MIN_LENGTH: u32 = 10;
pub const DEFAULT_MAX_LENGTH: u32 = 100;

const RESULT_TITLE: &str = "Результат:";

/// Narrow view of the platform's inline-query update.
#[derive(Debug, Clone)]
pub struct InlineQueryEvent {
    pub query_id: String,
    pub user_id: u64,
    pub text: String,
}

/// The "set inline results" capability of the platform transport.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn answer(&self, query_id: &str, results: Vec<InlineQueryResult>) -> Result<()>;
}

#[async_trait]
impl ReplySink for teloxide::Bot {
    async fn answer(&self, query_id: &str, results: Vec<InlineQueryResult>) -> Result<()> {
        self.answer_inline_query(query_id, results)
            .send()
            .await
            .context("answer inline query")?;
        Ok(())
    }
}

/// Strategy for choosing a generation length when the query leaves it unset.
pub trait LengthSource: Send + Sync {
    /// Picks a length from `[min, max)`.
    fn pick(&self, min: u32, max: u32) -> u32;
}

pub struct UniformLength;

impl LengthSource for UniformLength {
    fn pick(&self, min: u32, max: u32) -> u32 {
        rand::thread_rng().gen_range(min..max)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("result is empty")]
pub struct ResultIsEmpty;

pub struct InlineBot<R> {
    runner: R,
    lengths: Box<dyn LengthSource>,
    // immutable
    min_length: u32,
    max_length: u32,
}

impl<R: NetRunner> InlineBot<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            lengths: Box::new(UniformLength),
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_bounds(mut self, min_length: u32, max_length: u32) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn with_length_source(mut self, lengths: Box<dyn LengthSource>) -> Self {
        self.lengths = lengths;
        self
    }

    async fn query(&self, text: &str, length: u32) -> Result<String> {
        let length = if length == 0 {
            self.lengths.pick(self.min_length, self.max_length)
        } else {
            length
        };

        let answer = self
            .runner
            .query(Query {
                prompt: text.to_owned(),
                length,
            })
            .await
            .map_err(anyhow::Error::new)
            .and_then(|generation| {
                generation
                    .replies
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow::Error::new(ResultIsEmpty))
            });

        match &answer {
            Ok(reply) => tracing::debug!(text, length, answer = %reply, "queried server"),
            Err(err) => tracing::debug!(text, length, error = %err, "queried server"),
        }

        answer.context("failed to query neural network")
    }

    /// Handles one inline query: empty text is a deliberate no-op,
    /// anything else becomes exactly one article result.
    pub async fn handle<S: ReplySink>(&self, sink: &S, event: InlineQueryEvent) -> Result<()> {
        tracing::info!(user_id = event.user_id, query = %event.text, "inline query");

        if event.text.is_empty() {
            return Ok(());
        }

        let answer = self.query(&event.text, 0).await?;
        let result = build_result(&event.text, &answer);

        sink.answer(&event.query_id, vec![result])
            .await
            .context("set inline results")
    }
}

/// Builds the inline article for a query and its generated continuation.
///
/// The id is the hex SHA-256 of the query text, so identical queries hit
/// the platform's client-side result cache. The continuation is marked
/// bold; entity offsets are in codepoints, not bytes.
pub fn build_result(query_text: &str, answer: &str) -> InlineQueryResult {
    let message = format!("{query_text}{answer}");

    let bold = MessageEntity::new(
        MessageEntityKind::Bold,
        query_text.chars().count(),
        answer.chars().count(),
    );

    let content = InputMessageContentText::new(message.clone())
        .entities(vec![bold])
        .disable_web_page_preview(true);

    let id = hex::encode(Sha256::digest(query_text.as_bytes()));
    let article =
        InlineQueryResultArticle::new(id, RESULT_TITLE, InputMessageContent::Text(content))
            .description(message);

    InlineQueryResult::Article(article)
}
