use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use image::RgbImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::imaging::background::{enforce_background, verify_background, BackgroundReport};
use crate::imaging::enhance::purikura_boost;
use crate::imaging::grid::{comparison_grid, DEFAULT_CELL};
use crate::imaging::upscale::{enhanced_upscale, target_size};
use crate::imaging::vintage::vintage_print;
use crate::llm::gemini::{EditRequest, ImageEditor};
use crate::llm::media::{decode_image, detect_mime_type, encode_png, is_supported_image_mime, normalize_image_mime};
use crate::styles::{BoothStyle, PostProcess, StyleProfile};
use crate::utils::timing::{complete_photo_timer, start_photo_timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceMode {
    /// Every later photo is matched against photo 1's output.
    Master,
    /// Every later photo is matched against all earlier outputs.
    Chained,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub style: BoothStyle,
    pub model: String,
    pub fallback_models: Vec<String>,
    pub target_width: u32,
    pub reference_mode: ReferenceMode,
    pub between_photo_delay: Duration,
    pub enforce_background: Option<bool>,
    pub edge_aware_background: Option<bool>,
    pub verify_tolerance: u8,
    pub verify_min_ratio: f32,
    pub output_dir: PathBuf,
    pub comparison_grid: bool,
}

impl SessionOptions {
    pub fn from_config(config: &Config, style: BoothStyle) -> Self {
        SessionOptions {
            style,
            model: config.gemini_image_model.clone(),
            fallback_models: config.gemini_fallback_models.clone(),
            target_width: config.target_width,
            reference_mode: ReferenceMode::Master,
            between_photo_delay: Duration::from_secs(config.between_photo_delay_secs),
            enforce_background: None,
            edge_aware_background: None,
            verify_tolerance: config.verify_tolerance,
            verify_min_ratio: config.verify_min_ratio,
            output_dir: config.output_dir.clone(),
            comparison_grid: config.comparison_grid,
        }
    }

    fn models(&self) -> Vec<&str> {
        let mut models = vec![self.model.as_str()];
        for fallback in &self.fallback_models {
            if !models.contains(&fallback.as_str()) {
                models.push(fallback.as_str());
            }
        }
        models
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoResult {
    pub index: usize,
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub model: Option<String>,
    pub size: Option<(u32, u32)>,
    pub background: Option<BackgroundReport>,
    pub error: Option<String>,
}

impl PhotoResult {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub style: String,
    pub timestamp: String,
    pub photos: Vec<PhotoResult>,
    pub grid: Option<PathBuf>,
}

impl SessionSummary {
    pub fn succeeded(&self) -> usize {
        self.photos.iter().filter(|photo| photo.succeeded()).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.photos.is_empty() && self.succeeded() == self.photos.len()
    }
}

struct SourcePhoto {
    path: PathBuf,
    bytes: Vec<u8>,
    image: RgbImage,
}

struct StyledPhoto {
    reference: RgbImage,
    final_image: RgbImage,
    background: BackgroundReport,
}

struct SavedPhoto {
    model: String,
    styled: StyledPhoto,
    reference_bytes: Vec<u8>,
}

async fn load_source(path: &Path) -> Result<SourcePhoto> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read photo {}", path.display()))?;
    let image = decode_image(&raw).with_context(|| format!("Failed to decode {}", path.display()))?;

    // Anything Gemini would refuse is re-encoded as PNG.
    let supported = detect_mime_type(&raw)
        .map(|mime| is_supported_image_mime(&normalize_image_mime(&mime)))
        .unwrap_or(false);
    let bytes = if supported { raw } else { encode_png(&image)? };

    Ok(SourcePhoto {
        path: path.to_path_buf(),
        bytes,
        image,
    })
}

pub fn output_file_name(style_key: &str, timestamp: &str, photo_number: usize) -> String {
    format!("{style_key}_{timestamp}_{photo_number}.png")
}

pub struct PhotoSession<'a, E> {
    editor: &'a E,
    options: SessionOptions,
}

impl<'a, E: ImageEditor> PhotoSession<'a, E> {
    pub fn new(editor: &'a E, options: SessionOptions) -> Self {
        PhotoSession { editor, options }
    }

    fn profile(&self) -> &'static StyleProfile {
        self.options.style.profile()
    }

    fn build_request(
        &self,
        index: usize,
        target: &SourcePhoto,
        master: Option<&Vec<u8>>,
        references: &[Vec<u8>],
    ) -> EditRequest {
        let profile = self.profile();
        let (prompt, mut images) = if index == 0 {
            (profile.prompt_master.to_string(), Vec::new())
        } else {
            match self.options.reference_mode {
                ReferenceMode::Master => (
                    profile.prompt_match.to_string(),
                    master.cloned().into_iter().collect(),
                ),
                ReferenceMode::Chained => {
                    (profile.chained_prompt(references.len()), references.to_vec())
                }
            }
        };
        images.push(target.bytes.clone());

        EditRequest {
            system_instruction: profile.system_instruction.to_string(),
            prompt,
            images,
        }
    }

    /// Tries the primary model, then each fallback. Returns the model that answered.
    async fn generate(&self, request: &EditRequest) -> Result<(String, RgbImage)> {
        let mut last_error = None;
        for model in self.options.models() {
            match self.editor.edit(model, request).await {
                Ok(bytes) => match decode_image(&bytes) {
                    Ok(image) => return Ok((model.to_string(), image)),
                    Err(err) => {
                        warn!("Model {model} returned an undecodable image: {err}");
                        last_error = Some(err);
                    }
                },
                Err(err) => {
                    warn!("Model {model} failed: {err}");
                    last_error = Some(anyhow!(err));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("No image models configured")))
    }

    fn style_output(&self, image: RgbImage, target: (u32, u32)) -> Result<StyledPhoto> {
        let profile = self.profile();
        let color = profile.background_color;
        let enforce = self
            .options
            .enforce_background
            .unwrap_or(profile.enforce_background);
        let edge_aware = self
            .options
            .edge_aware_background
            .unwrap_or(profile.edge_aware_background);

        let mut image = match profile.post_process {
            PostProcess::FadedMonochrome => vintage_print(&image, &mut rand::thread_rng()),
            PostProcess::None | PostProcess::PurikuraBoost => image,
        };
        if enforce {
            let replaced =
                enforce_background(&mut image, color, profile.background_threshold, edge_aware);
            info!("Painted {replaced} pixels {color} before upscaling");
        }

        let reference = image.clone();
        let mut final_image = enhanced_upscale(&image, target)?;
        if profile.post_process == PostProcess::PurikuraBoost {
            final_image = purikura_boost(&final_image);
        }
        if enforce {
            enforce_background(&mut final_image, color, profile.background_threshold, edge_aware);
        }

        let background = verify_background(&final_image, color, self.options.verify_tolerance);
        if !background.passes(self.options.verify_min_ratio) {
            warn!(
                "Background check below threshold: {:.1}% of border pixels near {} (min {:.1}%)",
                background.ratio() * 100.0,
                color,
                self.options.verify_min_ratio * 100.0
            );
        }

        Ok(StyledPhoto {
            reference,
            final_image,
            background,
        })
    }

    /// Generate, style and save one photo. Any failure here belongs to this photo only.
    async fn process_photo(
        &self,
        request: &EditRequest,
        target: (u32, u32),
        path: &Path,
    ) -> Result<SavedPhoto> {
        let (model, image) = self.generate(request).await?;
        let styled = self.style_output(image, target)?;
        let reference_bytes = encode_png(&styled.reference)?;
        tokio::fs::write(path, encode_png(&styled.final_image)?)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Saved {} ({}x{}) via {}",
            path.display(),
            styled.final_image.width(),
            styled.final_image.height(),
            model
        );
        Ok(SavedPhoto {
            model,
            styled,
            reference_bytes,
        })
    }

    pub async fn run(&self, inputs: &[PathBuf]) -> Result<SessionSummary> {
        if inputs.is_empty() {
            bail!("No input photos to process");
        }

        let mut sources = Vec::with_capacity(inputs.len());
        for path in inputs {
            sources.push(load_source(path).await?);
        }

        let target = target_size(sources[0].image.dimensions(), self.options.target_width)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let profile = self.profile();
        tokio::fs::create_dir_all(&self.options.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory {}",
                    self.options.output_dir.display()
                )
            })?;

        info!(
            "Starting {} session: photos={} target={}x{} mode={:?} models={:?}",
            profile.name,
            sources.len(),
            target.0,
            target.1,
            self.options.reference_mode,
            self.options.models()
        );

        let mut master: Option<Vec<u8>> = None;
        let mut references: Vec<Vec<u8>> = Vec::new();
        let mut styled_previews: Vec<RgbImage> = Vec::new();
        let mut photos = Vec::with_capacity(sources.len());

        for (index, source) in sources.iter().enumerate() {
            let photo_number = index + 1;
            let source_name = source.path.display().to_string();
            let mut timer = start_photo_timer(profile.key, photo_number, &source_name);
            info!(
                "Photo {}/{}: {} ({})",
                photo_number,
                sources.len(),
                source_name,
                if index == 0 { "creating master style" } else { "matching reference" }
            );

            let request = self.build_request(index, source, master.as_ref(), &references);
            let output_path = self
                .options
                .output_dir
                .join(output_file_name(profile.key, &timestamp, photo_number));

            match self.process_photo(&request, target, &output_path).await {
                Ok(saved) => {
                    let SavedPhoto {
                        model,
                        styled,
                        reference_bytes,
                    } = saved;
                    if index == 0 {
                        master = Some(reference_bytes.clone());
                    }
                    references.push(reference_bytes);
                    complete_photo_timer(&mut timer, "success", Some(model.clone()));
                    photos.push(PhotoResult {
                        index: photo_number,
                        source: source.path.clone(),
                        output: Some(output_path),
                        model: Some(model),
                        size: Some(styled.final_image.dimensions()),
                        background: Some(styled.background),
                        error: None,
                    });
                    styled_previews.push(styled.reference);
                }
                Err(err) => {
                    warn!("Photo {photo_number} failed: {err:#}");
                    // The unstyled input keeps later requests well-formed.
                    if index == 0 {
                        master = Some(source.bytes.clone());
                    }
                    references.push(source.bytes.clone());
                    complete_photo_timer(&mut timer, "error", Some(format!("{err:#}")));
                    photos.push(PhotoResult {
                        index: photo_number,
                        source: source.path.clone(),
                        output: None,
                        model: None,
                        size: None,
                        background: None,
                        error: Some(format!("{err:#}")),
                    });
                }
            }

            if photo_number < sources.len() && !self.options.between_photo_delay.is_zero() {
                tokio::time::sleep(self.options.between_photo_delay).await;
            }
        }

        let mut summary = SessionSummary {
            style: profile.key.to_string(),
            timestamp,
            photos,
            grid: None,
        };

        if self.options.comparison_grid && summary.is_complete() {
            let originals: Vec<RgbImage> = sources.iter().map(|source| source.image.clone()).collect();
            match comparison_grid(&originals, &styled_previews, DEFAULT_CELL) {
                Ok(grid) => {
                    let path = self
                        .options
                        .output_dir
                        .join(format!("comparison_grid_{}.png", summary.timestamp));
                    let written = match encode_png(&grid) {
                        Ok(bytes) => tokio::fs::write(&path, bytes)
                            .await
                            .with_context(|| format!("Failed to write {}", path.display())),
                        Err(err) => Err(err),
                    };
                    match written {
                        Ok(()) => {
                            info!("Saved comparison grid {}", path.display());
                            summary.grid = Some(path);
                        }
                        Err(err) => warn!("Could not save comparison grid: {err:#}"),
                    }
                }
                Err(err) => warn!("Could not create comparison grid: {err}"),
            }
        }

        info!(
            "{} session finished: {}/{} photos",
            profile.name,
            summary.succeeded(),
            summary.photos.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use image::Rgb;
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::color::BackgroundColor;
    use crate::llm::gemini::ImageGenerationError;
    use crate::styles::purikura::{PURIKURA_MATCH_PROMPT, PURIKURA_PROMPT};

    enum Outcome {
        Image,
        /// Occupies photo 2's output path with a directory, then answers normally.
        ImageWithBlockedSave(PathBuf),
        Fail,
        TextOnly,
    }

    struct FakeEditor {
        script: Mutex<VecDeque<Outcome>>,
        calls: Mutex<Vec<(String, EditRequest)>>,
        image: RgbImage,
    }

    impl FakeEditor {
        fn new(script: Vec<Outcome>) -> Self {
            FakeEditor {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
                image: styled_image(250),
            }
        }

        fn with_image(mut self, image: RgbImage) -> Self {
            self.image = image;
            self
        }

        fn calls(&self) -> Vec<(String, EditRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    /// Pink subject in the middle of a light border.
    fn styled_image(border: u8) -> RgbImage {
        RgbImage::from_fn(16, 24, |x, y| {
            if x < 4 || y < 4 || x >= 12 || y >= 20 {
                Rgb([border, border, border])
            } else {
                Rgb([220, 120, 140])
            }
        })
    }

    impl ImageEditor for FakeEditor {
        async fn edit(
            &self,
            model: &str,
            request: &EditRequest,
        ) -> Result<Vec<u8>, ImageGenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), request.clone()));
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Outcome::Image);
            match next {
                Outcome::Image => Ok(encode_png(&self.image).unwrap()),
                Outcome::ImageWithBlockedSave(output_dir) => {
                    let saved = std::fs::read_dir(&output_dir)
                        .unwrap()
                        .filter_map(|entry| entry.ok())
                        .map(|entry| entry.file_name().to_string_lossy().into_owned())
                        .find(|name| name.ends_with("_1.png"))
                        .unwrap();
                    std::fs::create_dir(output_dir.join(saved.replace("_1.png", "_2.png"))).unwrap();
                    Ok(encode_png(&self.image).unwrap())
                }
                Outcome::Fail => Err(ImageGenerationError::Status {
                    status: 429,
                    detail: "Resource has been exhausted".to_string(),
                }),
                Outcome::TextOnly => Ok(b"Sorry, I can't help with that.".to_vec()),
            }
        }
    }

    fn write_inputs(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|index| {
                let shade = 40 + index as u8 * 30;
                let image = RgbImage::from_pixel(20, 30, Rgb([shade, 90, 160]));
                let path = dir.path().join(format!("photo_{index}.png"));
                std::fs::write(&path, encode_png(&image).unwrap()).unwrap();
                path
            })
            .collect()
    }

    fn options(output_dir: PathBuf, mode: ReferenceMode) -> SessionOptions {
        SessionOptions {
            style: BoothStyle::Japanese,
            model: "primary".to_string(),
            fallback_models: vec!["fallback".to_string()],
            target_width: 40,
            reference_mode: mode,
            between_photo_delay: Duration::ZERO,
            enforce_background: None,
            edge_aware_background: None,
            verify_tolerance: 12,
            verify_min_ratio: 0.85,
            output_dir,
            comparison_grid: true,
        }
    }

    #[tokio::test]
    async fn master_mode_matches_every_photo_to_the_first_output() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 3);
        let editor = FakeEditor::new(Vec::new());
        let session = PhotoSession::new(
            &editor,
            options(output_dir.path().to_path_buf(), ReferenceMode::Master),
        );

        let summary = session.run(&inputs).await.unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.style, "japanese");
        let calls = editor.calls();
        assert_eq!(calls.len(), 3);

        let (model, first) = &calls[0];
        assert_eq!(model, "primary");
        assert_eq!(first.prompt, PURIKURA_PROMPT);
        assert!(first.system_instruction.is_empty());
        assert_eq!(first.images, vec![std::fs::read(&inputs[0]).unwrap()]);

        for (index, (_, request)) in calls.iter().enumerate().skip(1) {
            assert_eq!(request.prompt, PURIKURA_MATCH_PROMPT);
            assert_eq!(request.images.len(), 2);
            assert_eq!(request.images[0], calls[1].1.images[0]);
            assert_eq!(decode_image(&request.images[0]).unwrap().dimensions(), (16, 24));
            assert_eq!(request.images[1], std::fs::read(&inputs[index]).unwrap());
        }

        for (index, photo) in summary.photos.iter().enumerate() {
            let output = photo.output.as_ref().unwrap();
            assert_eq!(
                output.file_name().unwrap().to_string_lossy(),
                output_file_name("japanese", &summary.timestamp, index + 1)
            );
            let saved = decode_image(&std::fs::read(output).unwrap()).unwrap();
            assert_eq!(saved.dimensions(), (40, 60));
            assert_eq!(photo.size, Some((40, 60)));
            assert!(photo.background.unwrap().passes(0.85));
        }

        let grid = summary.grid.expect("grid should be written");
        let grid_image = decode_image(&std::fs::read(grid).unwrap()).unwrap();
        assert_eq!(grid_image.dimensions(), (DEFAULT_CELL.0 * 3, DEFAULT_CELL.1 * 2 + 40));
    }

    #[tokio::test]
    async fn falls_back_to_next_model_on_failure() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 1);
        let editor = FakeEditor::new(vec![Outcome::Fail]);
        let session = PhotoSession::new(
            &editor,
            options(output_dir.path().to_path_buf(), ReferenceMode::Master),
        );

        let summary = session.run(&inputs).await.unwrap();

        let models: Vec<String> = editor.calls().into_iter().map(|(model, _)| model).collect();
        assert_eq!(models, vec!["primary", "fallback"]);
        assert_eq!(summary.photos[0].model.as_deref(), Some("fallback"));
        assert!(summary.is_complete());
    }

    #[tokio::test]
    async fn chained_mode_uses_input_as_stand_in_for_failed_photo() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 3);
        let editor = FakeEditor::new(vec![Outcome::Image, Outcome::Fail, Outcome::TextOnly]);
        let session = PhotoSession::new(
            &editor,
            options(output_dir.path().to_path_buf(), ReferenceMode::Chained),
        );

        let summary = session.run(&inputs).await.unwrap();

        assert_eq!(summary.succeeded(), 2);
        assert!(!summary.photos[1].succeeded());
        assert!(summary.photos[1].error.is_some());
        assert!(summary.grid.is_none());

        let calls = editor.calls();
        assert_eq!(calls.len(), 4);
        let (_, last) = &calls[3];
        assert_eq!(last.images.len(), 3);
        assert_eq!(last.images[1], std::fs::read(&inputs[1]).unwrap());
        assert_eq!(last.images[2], std::fs::read(&inputs[2]).unwrap());
        assert!(last.prompt.contains("- Image 3: TARGET (photo 3 to transform)"));
    }

    #[tokio::test]
    async fn failed_master_falls_back_to_first_input() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 2);
        let editor = FakeEditor::new(vec![Outcome::Fail, Outcome::Fail]);
        let session = PhotoSession::new(
            &editor,
            options(output_dir.path().to_path_buf(), ReferenceMode::Master),
        );

        let summary = session.run(&inputs).await.unwrap();

        assert_eq!(summary.succeeded(), 1);
        let calls = editor.calls();
        let (_, second) = calls.last().unwrap();
        assert_eq!(second.images[0], std::fs::read(&inputs[0]).unwrap());
    }

    #[tokio::test]
    async fn empty_session_is_an_error() {
        let output_dir = tempdir().unwrap();
        let editor = FakeEditor::new(Vec::new());
        let session = PhotoSession::new(
            &editor,
            options(output_dir.path().to_path_buf(), ReferenceMode::Master),
        );
        assert!(session.run(&[]).await.is_err());
        assert!(editor.calls().is_empty());
    }

    #[test]
    fn fallback_list_skips_duplicates() {
        let mut options = options(PathBuf::from("out"), ReferenceMode::Master);
        options.fallback_models = vec!["primary".to_string(), "fallback".to_string()];
        assert_eq!(options.models(), vec!["primary", "fallback"]);
    }

    fn is_gray(image: &RgbImage) -> bool {
        image.pixels().all(|pixel| {
            let [r, g, b] = pixel.0;
            r == g && g == b
        })
    }

    #[tokio::test]
    async fn failed_save_is_recorded_and_session_continues() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 3);
        let editor = FakeEditor::new(vec![
            Outcome::Image,
            Outcome::ImageWithBlockedSave(output_dir.path().to_path_buf()),
        ]);
        let session = PhotoSession::new(
            &editor,
            options(output_dir.path().to_path_buf(), ReferenceMode::Master),
        );

        let summary = session.run(&inputs).await.unwrap();

        assert_eq!(editor.calls().len(), 3);
        assert_eq!(summary.photos.len(), 3);
        assert!(summary.photos[0].succeeded());
        assert!(!summary.photos[1].succeeded());
        assert!(summary.photos[1]
            .error
            .as_deref()
            .unwrap()
            .contains("Failed to write"));
        assert!(summary.photos[2].succeeded());
        assert_eq!(summary.succeeded(), 2);
        assert!(summary.grid.is_none());
    }

    #[tokio::test]
    async fn new_york_prints_are_gray_and_keep_their_background() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 2);
        let editor = FakeEditor::new(Vec::new());
        let mut options = options(output_dir.path().to_path_buf(), ReferenceMode::Master);
        options.style = BoothStyle::NewYork;
        let session = PhotoSession::new(&editor, options);

        let summary = session.run(&inputs).await.unwrap();
        assert!(summary.is_complete());
        assert_eq!(summary.style, "newyork");

        let calls = editor.calls();
        let reference = decode_image(&calls[1].1.images[0]).unwrap();
        assert!(is_gray(&reference));
        assert!(reference
            .pixels()
            .all(|pixel| (0x25 - 3..=0xEB + 3).contains(&pixel.0[0])));

        for photo in &summary.photos {
            let saved = decode_image(&std::fs::read(photo.output.as_ref().unwrap()).unwrap()).unwrap();
            assert!(is_gray(&saved));
            let white = verify_background(&saved, BackgroundColor::WHITE, 0);
            assert!(white.ratio() < 0.5);
        }
    }

    #[tokio::test]
    async fn background_enforcement_can_be_switched_off() {
        let input_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 2);

        let mut corners = Vec::new();
        for enforce in [None, Some(false)] {
            let output_dir = tempdir().unwrap();
            let editor = FakeEditor::new(Vec::new()).with_image(styled_image(240));
            let mut options = options(output_dir.path().to_path_buf(), ReferenceMode::Master);
            options.enforce_background = enforce;
            PhotoSession::new(&editor, options).run(&inputs).await.unwrap();

            let reference = decode_image(&editor.calls()[1].1.images[0]).unwrap();
            corners.push(reference.get_pixel(0, 0).0);
            assert_eq!(reference.get_pixel(8, 12).0, [220, 120, 140]);
        }

        assert_eq!(corners, vec![[255, 255, 255], [240, 240, 240]]);
    }

    #[tokio::test]
    async fn edge_aware_enforcement_leaves_the_middle_alone() {
        let input_dir = tempdir().unwrap();
        let inputs = write_inputs(&input_dir, 2);

        let mut centers = Vec::new();
        for edge_aware in [None, Some(true)] {
            let output_dir = tempdir().unwrap();
            let editor = FakeEditor::new(Vec::new())
                .with_image(RgbImage::from_pixel(20, 20, Rgb([245, 245, 245])));
            let mut options = options(output_dir.path().to_path_buf(), ReferenceMode::Master);
            options.edge_aware_background = edge_aware;
            PhotoSession::new(&editor, options).run(&inputs).await.unwrap();

            let reference = decode_image(&editor.calls()[1].1.images[0]).unwrap();
            assert_eq!(reference.get_pixel(0, 0).0, [255, 255, 255]);
            assert_eq!(reference.get_pixel(19, 19).0, [255, 255, 255]);
            centers.push(reference.get_pixel(10, 10).0);
        }

        assert_eq!(centers, vec![[255, 255, 255], [245, 245, 245]]);
    }
}
