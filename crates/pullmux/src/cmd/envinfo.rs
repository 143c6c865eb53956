use comfy_table::{presets::UTF8_FULL, Table};
use pullmux_demux::{DemuxConfig, INITIAL_CAPACITY_ENV, MAX_PROBE_SIZE_ENV};
use pullmux_frame::codec_id;
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct BuildInfo {
    version: &'static str,
    target: String,
    rustc: &'static str,
    git_hash: &'static str,
}

/// One buffer-sizing knob: its variable, raw value, and what it resolves to.
#[derive(Serialize)]
struct Setting {
    variable: &'static str,
    raw: Option<String>,
    effective: Option<usize>,
    problem: Option<String>,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    schema_id: &'static str,
    build: BuildInfo,
    engines: Vec<&'static str>,
    codecs: Vec<&'static str>,
    settings: Vec<Setting>,
    rust_log: Option<String>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let output = EnvInfoOutput {
        schema_id: "pullmux/cli/v1/envinfo",
        build: BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            target: target_triple(),
            rustc: option_env!("RUSTC_VERSION").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        },
        engines: vec!["pmx"],
        codecs: known_codecs(),
        settings: resolve_settings(|name| std::env::var(name).ok()),
        rust_log: std::env::var("RUST_LOG").ok(),
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    option_env!("PULLMUX_BUILD_TARGET").map_or_else(
        || format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
        str::to_string,
    )
}

fn known_codecs() -> Vec<&'static str> {
    (codec_id::H264..=codec_id::PCM_S16LE)
        .map(codec_id::codec_name)
        .collect()
}

/// Resolve the buffer variables through the same loader contexts use. When
/// the loader rejects them, every setting carries its error.
fn resolve_settings(lookup: impl Fn(&str) -> Option<String>) -> Vec<Setting> {
    let resolved = DemuxConfig::from_lookup(&lookup);
    let setting = |variable: &'static str, pick: fn(&DemuxConfig) -> Option<usize>| {
        let (effective, problem) = match &resolved {
            Ok(config) => (pick(config), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Setting {
            variable,
            raw: lookup(variable),
            effective,
            problem,
        }
    };
    vec![
        setting(INITIAL_CAPACITY_ENV, |config| Some(config.initial_capacity)),
        setting(MAX_PROBE_SIZE_ENV, |config| config.max_capacity),
    ]
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            println!(
                "pullmux {} ({}), rustc {}, git {}",
                output.build.version, output.build.target, output.build.rustc, output.build.git_hash
            );
            println!("engines: {}", output.engines.join(", "));
            println!("codecs:  {}", output.codecs.join(", "));

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["VARIABLE", "VALUE", "EFFECTIVE", "PROBLEM"]);
            for setting in &output.settings {
                table.add_row(vec![
                    setting.variable.to_string(),
                    setting.raw.clone().unwrap_or_else(|| "(not set)".to_string()),
                    effective_cell(setting),
                    setting.problem.clone().unwrap_or_default(),
                ]);
            }
            table.add_row(vec![
                "RUST_LOG".to_string(),
                output.rust_log.clone().unwrap_or_else(|| "(not set)".to_string()),
                String::new(),
                String::new(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("version={} target={}", output.build.version, output.build.target);
            for setting in &output.settings {
                println!("{}={}", setting.variable, effective_cell(setting));
            }
        }
        OutputFormat::Raw => println!("{}", output.build.version),
    }
}

fn effective_cell(setting: &Setting) -> String {
    match (setting.effective, &setting.problem) {
        (_, Some(_)) => "invalid".to_string(),
        (Some(bytes), None) => bytes.to_string(),
        (None, None) => "unlimited".to_string(),
    }
}
