use dream_canvas::{GenerationRequest, GenResult};
use std::process::ExitCode;

/// 요청 JSON 을 읽어 실제로 적용될 작업 구성을 출력한다 (모델 로드 없음)
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: dream_canvas <request.json>");
        return ExitCode::from(2);
    };
    match plan(&path) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("{{\"success\":false,\"error\":\"{}\"}}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn plan(path: &str) -> GenResult<String> {
    let request = GenerationRequest::from_json_str(&std::fs::read_to_string(path)?)?;
    let mode = request.mode();
    let config = request.to_config(mode, !request.images.is_empty())?;
    log::info!(
        "{mode:?} job on {} backend: {} iterations at {}x{}",
        config.decoder.kind,
        config.iterations,
        config.decoder.height,
        config.decoder.width
    );
    config.to_json_string()
}
