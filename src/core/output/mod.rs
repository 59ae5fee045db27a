//! # 프레임 출력
//!
//! 보간기와 작업 실행기는 `FrameSink` 로 프레임을 흘려보낸다.
//! 컨테이너 인코딩(mp4 등)은 이 크레이트 밖의 일이다.


use crate::core::error::GenResult;
use image::RgbImage;
use std::path::{Path, PathBuf};

pub trait FrameSink {
    /// 의도한 재생 속도
    fn fps(&self) -> u32;

    fn push(&mut self, frame: &RgbImage) -> GenResult<()>;

    fn finish(&mut self) -> GenResult<()> {
        Ok(())
    }
}

/// 메모리에 모으는 싱크
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    fps: u32,
    frames: Vec<RgbImage>,
}

impl VecSink {
    pub fn new(fps: u32) -> Self {
        Self { fps, frames: Vec::new() }
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RgbImage> {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSink for VecSink {
    fn fps(&self) -> u32 {
        self.fps
    }

    fn push(&mut self, frame: &RgbImage) -> GenResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// `{prefix}_{index:05}.png` 순번 PNG 로 저장하는 싱크
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    fps: u32,
    written: usize,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, fps: u32) -> GenResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, prefix: prefix.into(), fps, written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{:05}.png", self.prefix, index))
    }
}

impl FrameSink for PngSequenceSink {
    fn fps(&self) -> u32 {
        self.fps
    }

    fn push(&mut self, frame: &RgbImage) -> GenResult<()> {
        save_png(frame, self.frame_path(self.written))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> GenResult<()> {
        log::info!("wrote {} frames to {}", self.written, self.dir.display());
        Ok(())
    }
}

pub fn save_png(frame: &RgbImage, path: impl AsRef<Path>) -> GenResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    frame.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
