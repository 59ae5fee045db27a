//! `DecoderKind` → 디코더 인스턴스

use super::{CodebookDecoder, Decoder, DecoderConfig, DecoderKind, LatentDecoder, SpectralDecoder};
use crate::core::error::{GenError, GenResult};
use crate::core::models::ModelContext;
use rand::rngs::StdRng;

/// 설정과 모델 컨텍스트로 디코더를 구성
///
/// 생성기가 필요한 변형인데 컨텍스트에 등록되지 않았다면 `UnsupportedBackend`.
pub fn build_decoder(
    config: &DecoderConfig,
    ctx: &ModelContext,
    rng: &mut StdRng,
) -> GenResult<Box<dyn Decoder>> {
    let kind = config.kind;
    log::debug!("building {kind} decoder (batch {})", config.batch);

    let generator = if kind.requires_generator() {
        Some(
            ctx.generator(kind)
                .ok_or_else(|| GenError::UnsupportedBackend(format!("{kind} (no generator loaded)")))?,
        )
    } else {
        None
    };

    let decoder: Box<dyn Decoder> = match (kind, generator) {
        (DecoderKind::Spectral, _) => Box::new(SpectralDecoder::new(
            config.batch,
            config.height,
            config.width,
            &config.spectral,
            rng,
            ctx.device(),
        )?),
        (DecoderKind::Codebook, Some(generator)) => Box::new(CodebookDecoder::new(
            config.batch,
            &config.codebook,
            generator,
            ctx.code_encoder(kind),
        )?),
        (DecoderKind::VqLatent | DecoderKind::StyleLatent, Some(generator)) => {
            let mut latent = config.latent.clone();
            if let Some(first) = latent.dims.first_mut() {
                *first = config.batch;
            }
            Box::new(LatentDecoder::new(kind, &latent, generator, ctx.code_encoder(kind))?)
        }
        (other, None) => return Err(GenError::UnsupportedBackend(other.to_string())),
    };
    Ok(decoder)
}
