//! midi-remote-cli - 命令行工具
//!
//! 浏览远程曲库、通过本地 MIDI 端口播放，以及管理服务器上的文件。
//! 服务地址、端口和 token 从环境变量读取（MIDI_REMOTE_API / MIDI_REMOTE_PORT / MIDI_REMOTE_TOKEN）。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use midi_catalog::{list_catalog_with, CatalogClient, CatalogConfig, CatalogError};
use midi_player::{
    spawn_default_player, MidirBackend, OutputBackend, PlayRequest, PlayerConfig, PlayerEvent,
    StopReason, TrackSource,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        usage(&args[0]);
        process::exit(1);
    }

    let command = args[1].as_str();
    let catalog_config = CatalogConfig::from_env();
    let player_config = PlayerConfig::from_env();
    log::debug!("Command '{}', catalog {}", command, catalog_config.api_url);

    match command {
        "list" => {
            let filter = args.get(2).map(String::as_str).unwrap_or("");
            for name in list_catalog_with(&catalog_config, filter) {
                println!("{}", name);
            }
        }
        "ports" => {
            let backend = MidirBackend::new(player_config.client_name.clone());
            match backend.port_names() {
                Ok(names) if names.is_empty() => println!("No MIDI output ports found"),
                Ok(names) => {
                    for (i, name) in names.iter().enumerate() {
                        println!("  {}: {}", i, name);
                    }
                }
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        "play" => {
            let Some(name) = args.get(2) else {
                eprintln!("Usage: {} play <filename> [port]", args[0]);
                process::exit(1);
            };
            let client = catalog_client(&catalog_config);
            let url = match client.file_url(name) {
                Ok(url) => url,
                Err(e) => exit_with(e),
            };
            log::info!("Resolved {} -> {}", name, url);
            let port = args.get(3).cloned().unwrap_or(player_config.port_name.clone());
            play(TrackSource::Remote(url.to_string()), port, player_config);
        }
        "play-file" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: {} play-file <path.mid> [port]", args[0]);
                process::exit(1);
            };
            let port = args.get(3).cloned().unwrap_or(player_config.port_name.clone());
            play(TrackSource::Local(PathBuf::from(path)), port, player_config);
        }
        "login" => {
            let Some(password) = args.get(2) else {
                eprintln!("Usage: {} login <password>", args[0]);
                process::exit(1);
            };
            let mut client = catalog_client(&catalog_config);
            match client.login(password) {
                Ok(token) => println!("{}", token),
                Err(e) => exit_with(e),
            }
        }
        "upload" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: {} upload <path.mid>", args[0]);
                process::exit(1);
            };
            report(catalog_client(&catalog_config).upload(Path::new(path)), "Uploaded");
        }
        "rename" => {
            if args.len() < 4 {
                eprintln!("Usage: {} rename <old> <new>", args[0]);
                process::exit(1);
            }
            report(
                catalog_client(&catalog_config).rename(&args[2], &args[3]),
                "Renamed",
            );
        }
        "delete" => {
            let Some(name) = args.get(2) else {
                eprintln!("Usage: {} delete <filename>", args[0]);
                process::exit(1);
            };
            report(catalog_client(&catalog_config).delete(name), "Deleted");
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            usage(&args[0]);
            process::exit(1);
        }
    }
}

fn usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} list [filter]", program);
    eprintln!("  {} ports", program);
    eprintln!("  {} play <filename> [port]", program);
    eprintln!("  {} play-file <path.mid> [port]", program);
    eprintln!("  {} login <password>        # prints a token for MIDI_REMOTE_TOKEN", program);
    eprintln!("  {} upload <path.mid>", program);
    eprintln!("  {} rename <old> <new>", program);
    eprintln!("  {} delete <filename>", program);
}

fn catalog_client(config: &CatalogConfig) -> CatalogClient {
    match CatalogClient::new(config) {
        Ok(client) => client,
        Err(e) => exit_with(e),
    }
}

fn report(result: Result<(), CatalogError>, done: &str) {
    match result {
        Ok(()) => println!("{}", done),
        Err(e) => exit_with(e),
    }
}

fn exit_with(err: CatalogError) -> ! {
    match err {
        CatalogError::Forbidden => {
            eprintln!("Forbidden: check MIDI_REMOTE_TOKEN");
            process::exit(3);
        }
        other => {
            eprintln!("Failed: {}", other);
            process::exit(1);
        }
    }
}

/// 播放并阻塞到会话结束
fn play(source: TrackSource, port: String, config: PlayerConfig) {
    let handle = spawn_default_player(config);
    handle.play(PlayRequest::new(source, port));

    let mut reason = StopReason::Failed;
    while let Ok(event) = handle.evt_rx.recv() {
        match event {
            PlayerEvent::TrackInfo(info) => {
                println!(
                    "{} ({}, {} messages, {})",
                    info.label,
                    info.format,
                    info.message_count,
                    format_duration(info.duration)
                );
            }
            PlayerEvent::Progress(progress) if !progress.is_idle() => {
                print!(
                    "\r{} / {}",
                    format_duration(progress.elapsed),
                    format_duration(progress.total)
                );
                let _ = std::io::stdout().flush();
            }
            PlayerEvent::Error(e) => {
                eprintln!("\nPlayback failed: {}", e);
            }
            PlayerEvent::Finished(r) => {
                reason = r;
                println!();
                break;
            }
            _ => {}
        }
    }

    handle.shutdown();
    log::debug!("Session finished: {:?}", reason);

    if reason == StopReason::Failed {
        process::exit(1);
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
