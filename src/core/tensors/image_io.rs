//! 텐서 ↔ RGB 프레임 변환, 참조 이미지 전처리

use crate::core::error::{GenError, GenResult};
use candle_core::{DType, Device, Tensor};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// `(B, 3, H, W)` 범위 [0,1] 텐서를 프레임들로 변환 (clip 후 255 배, 절삭)
pub fn tensor_to_frames(image: &Tensor) -> GenResult<Vec<RgbImage>> {
    let (batch, channels, height, width) = image.dims4()?;
    if channels != 3 {
        return Err(GenError::ShapeMismatch {
            context: "frame conversion",
            expected: vec![batch, 3, height, width],
            actual: image.dims().to_vec(),
        });
    }

    // HWC 순서로 재배열
    let hwc = image
        .detach()
        .to_dtype(DType::F32)?
        .clamp(0f32, 1f32)?
        .permute((0, 2, 3, 1))?
        .contiguous()?;
    let data = hwc.flatten_all()?.to_vec1::<f32>()?;

    let plane = height * width * 3;
    let mut frames = Vec::with_capacity(batch);
    for b in 0..batch {
        let bytes: Vec<u8> = data[b * plane..(b + 1) * plane]
            .iter()
            .map(|v| (v * 255.0) as u8)
            .collect();
        let frame = RgbImage::from_raw(width as u32, height as u32, bytes)
            .ok_or_else(|| GenError::invalid_config("frame buffer size mismatch"))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// 첫 번째 배치 원소만 렌더링
pub fn tensor_to_frame(image: &Tensor) -> GenResult<RgbImage> {
    tensor_to_frames(image)?
        .into_iter()
        .next()
        .ok_or_else(|| GenError::invalid_config("empty image batch"))
}

/// RGB 이미지를 `(1, 3, H, W)` [0,1] 텐서로
pub fn rgb_to_tensor(img: &RgbImage, device: &Device) -> GenResult<Tensor> {
    let (width, height) = img.dimensions();
    let data: Vec<f32> = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    let hwc = Tensor::from_vec(data, (height as usize, width as usize, 3), device)?;
    Ok(hwc.permute((2, 0, 1))?.contiguous()?.unsqueeze(0)?)
}

/// 짧은 변을 맞춘 뒤 중앙 크롭 (Lanczos)
pub fn fit_reference(img: &RgbImage, width: usize, height: usize) -> RgbImage {
    let (src_w, src_h) = img.dimensions();
    let scale = f64::max(
        width as f64 / src_w.max(1) as f64,
        height as f64 / src_h.max(1) as f64,
    );
    let scaled_w = ((src_w as f64 * scale).round() as u32).max(width as u32);
    let scaled_h = ((src_h as f64 * scale).round() as u32).max(height as u32);

    let resized = imageops::resize(img, scaled_w, scaled_h, FilterType::Lanczos3);
    let left = (scaled_w - width as u32) / 2;
    let top = (scaled_h - height as u32) / 2;
    imageops::crop_imm(&resized, left, top, width as u32, height as u32).to_image()
}
