//! Level data for launched games
//!
//! Reproduction games need a mosaic from an external provider; block games
//! only announce their board size. Providers are async and run outside the
//! server's event loop.

use log::debug;
use shared::protocol::LevelData;
use shared::reproduction::MosaicError;
use shared::{GameId, MosaicLevel};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("mosaic request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mosaic provider answered with status {0}")]
    Status(u16),
    #[error("cannot read mosaic file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed mosaic: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unplayable mosaic: {0}")]
    Invalid(#[from] MosaicError),
}

pub type LevelFuture<'a> = Pin<Box<dyn Future<Output = Result<MosaicLevel, LevelError>> + Send + 'a>>;

/// Source of reproduction mosaics
pub trait LevelProvider: Send + Sync {
    fn fetch_mosaic(&self) -> LevelFuture<'_>;
}

fn check_board(level: MosaicLevel) -> Result<MosaicLevel, LevelError> {
    level.validate()?;
    Ok(level)
}

/// Fetches a random mosaic over HTTP, authenticating with `X-API-KEY`
pub struct HttpMosaicProvider {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpMosaicProvider {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key,
        }
    }
}

impl LevelProvider for HttpMosaicProvider {
    fn fetch_mosaic(&self) -> LevelFuture<'_> {
        Box::pin(async move {
            let mut request = self.client.get(&self.url);
            if let Some(key) = &self.api_key {
                request = request.header("X-API-KEY", key);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LevelError::Status(status.as_u16()));
            }

            let level: MosaicLevel = response.json().await?;
            debug!(
                "Fetched {}x{} mosaic with {} bricks",
                level.rows,
                level.cols,
                level.bricks_queue.len()
            );
            check_board(level)
        })
    }
}

/// Serves the same mosaic for every launch
#[derive(Debug, Clone)]
pub struct StaticLevelProvider {
    level: MosaicLevel,
}

impl StaticLevelProvider {
    pub fn new(level: MosaicLevel) -> Self {
        Self { level }
    }

    /// Loads the mosaic from a JSON file in the provider's wire format
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let text = tokio::fs::read_to_string(path).await?;
        let level: MosaicLevel = serde_json::from_str(&text)?;
        Ok(Self::new(check_board(level)?))
    }
}

impl LevelProvider for StaticLevelProvider {
    fn fetch_mosaic(&self) -> LevelFuture<'_> {
        let level = self.level.clone();
        Box::pin(async move { check_board(level) })
    }
}

/// Level payload for `game`. Only reproduction games touch the provider.
pub async fn level_for(provider: &dyn LevelProvider, game: GameId) -> Result<LevelData, LevelError> {
    match game {
        GameId::Reproduction => Ok(LevelData::Mosaic(provider.fetch_mosaic().await?)),
        GameId::BlockClear => Ok(LevelData::block_game()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::reproduction::QueueBrick;
    use shared::Rect;

    fn sample_level() -> MosaicLevel {
        MosaicLevel {
            rows: 2,
            cols: 2,
            target_bricks: vec![Rect::new(0, 0, 2, 2, "#D92328")],
            bricks_queue: vec![QueueBrick::Color("#D92328".to_string())],
        }
    }

    #[tokio::test]
    async fn test_static_provider_serves_level() {
        let provider = StaticLevelProvider::new(sample_level());
        let level = provider.fetch_mosaic().await.unwrap();
        assert_eq!(level, sample_level());
    }

    #[tokio::test]
    async fn test_block_game_skips_provider() {
        let provider = StaticLevelProvider::new(MosaicLevel {
            rows: 0,
            cols: 0,
            target_bricks: vec![],
            bricks_queue: vec![],
        });
        let level = level_for(&provider, GameId::BlockClear).await.unwrap();
        assert_eq!(level, LevelData::block_game());

        let err = level_for(&provider, GameId::Reproduction).await.unwrap_err();
        assert!(matches!(err, LevelError::Invalid(MosaicError::BoardSize(0, 0))));
    }

    #[tokio::test]
    async fn test_provider_rejects_brick_outside_board() {
        let mut level = sample_level();
        level.target_bricks.push(Rect::new(0, usize::MAX, 1, 2, "#006CB7"));
        let provider = StaticLevelProvider::new(level);

        let err = provider.fetch_mosaic().await.unwrap_err();
        assert!(matches!(err, LevelError::Invalid(MosaicError::TargetOutOfBounds(1))));
    }

    #[tokio::test]
    async fn test_from_file_rejects_oversized_board() {
        let path = std::env::temp_dir().join(format!("mosaic-huge-{}.json", std::process::id()));
        let json = r##"{"rows":1000000000000,"cols":2,"targetBricks":[],"bricksQueue":["#D92328"]}"##;
        tokio::fs::write(&path, json).await.unwrap();

        let result = StaticLevelProvider::from_file(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();
        assert!(matches!(
            result,
            Err(LevelError::Invalid(MosaicError::BoardSize(1_000_000_000_000, 2)))
        ));
    }

    #[tokio::test]
    async fn test_from_file_reads_wire_format() {
        let path = std::env::temp_dir().join(format!("mosaic-{}.json", std::process::id()));
        let json = r##"{"rows":2,"cols":2,"targetBricks":[{"x":0,"y":0,"w":2,"h":2,"color":"#D92328"}],"bricksQueue":["#D92328"]}"##;
        tokio::fs::write(&path, json).await.unwrap();

        let provider = StaticLevelProvider::from_file(&path).await.unwrap();
        let level = provider.fetch_mosaic().await.unwrap();
        assert_eq!(level, sample_level());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let result = StaticLevelProvider::from_file("/nonexistent/mosaic.json").await;
        assert!(matches!(result, Err(LevelError::Io(_))));
    }
}
