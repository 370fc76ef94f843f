// Screen and pointer collaborators of the automation loop.
// Real OS capture / pointer injection live outside this crate; these traits
// are the seams they plug into.
use super::error::{MatchError, MatchResult};
use super::match_image::CardPair;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Produces the board image to analyse
#[allow(async_fn_in_trait)]
pub trait ScreenSource: Send + Sync {
    async fn capture(&self) -> MatchResult<RgbImage>;

    fn name(&self) -> &str;
}

/// Performs a pointer click at screen coordinates
#[allow(async_fn_in_trait)]
pub trait ClickExecutor: Send + Sync {
    async fn click(&self, x: u32, y: u32) -> MatchResult<()>;
}

/// Decode an image file into 8-bit RGB
pub fn load_rgb_image(path: &Path) -> MatchResult<RgbImage> {
    let image = image::open(path).map_err(|source| MatchError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// Reads the board from an image file on every capture
pub struct ImageFileSource {
    path: PathBuf,
    name: String,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        Self { path, name }
    }
}

impl ScreenSource for ImageFileSource {
    async fn capture(&self) -> MatchResult<RgbImage> {
        let path = self.path.clone();
        let start = std::time::Instant::now();
        let image = tokio::task::spawn_blocking(move || load_rgb_image(&path)).await??;
        log::debug!(
            "📸 Loaded {} ({}x{}) in {}ms",
            self.name,
            image.width(),
            image.height(),
            start.elapsed().as_millis()
        );
        Ok(image)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Hands out a copy of an image already in memory
pub struct StaticImageSource {
    image: RgbImage,
}

impl StaticImageSource {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }
}

impl ScreenSource for StaticImageSource {
    async fn capture(&self) -> MatchResult<RgbImage> {
        Ok(self.image.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Logs clicks instead of performing them and keeps a record of each one
#[derive(Clone, Default)]
pub struct DryRunClicker {
    clicks: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl DryRunClicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every click received so far, in order
    pub async fn clicks(&self) -> Vec<(u32, u32)> {
        self.clicks.lock().await.clone()
    }
}

impl ClickExecutor for DryRunClicker {
    async fn click(&self, x: u32, y: u32) -> MatchResult<()> {
        log::info!("🖱️ Click at ({}, {})", x, y);
        self.clicks.lock().await.push((x, y));
        Ok(())
    }
}

/// Click the centre of both cards of every pair, pausing `delay` after each
/// click so the game can flip the card.
pub async fn click_pairs<C: ClickExecutor>(
    clicker: &C,
    pairs: &[CardPair],
    delay: Duration,
) -> MatchResult<usize> {
    let mut clicked = 0;
    for pair in pairs {
        for (x, y) in pair.click_points() {
            clicker.click(x, y).await?;
            tokio::time::sleep(delay).await;
        }
        clicked += 1;
    }
    Ok(clicked)
}
