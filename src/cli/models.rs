// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `models` commands

use anyhow::Result;
use clap::Subcommand;

use super::build_adapter;
use crate::config::{AppConfig, ModelSourceConfig};

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Show where each task's model comes from
    List,

    /// Download and load both models
    Fetch,
}

pub async fn run(config: &AppConfig, command: ModelsCommand) -> Result<()> {
    match command {
        ModelsCommand::List => {
            print_source("caption", &config.models.caption);
            print_source("vqa", &config.models.vqa);
            Ok(())
        }
        ModelsCommand::Fetch => fetch(config).await,
    }
}

fn print_source(task: &str, source: &ModelSourceConfig) {
    println!("{}", describe_source(task, source));
    for file in source.required_files() {
        println!("    {}", file);
    }
}

pub(crate) fn describe_source(task: &str, source: &ModelSourceConfig) -> String {
    match source.local_dir.as_deref().filter(|d| d.is_dir()) {
        Some(dir) => format!("{:<8} {} (local: {})", task, source.model_id, dir.display()),
        None => format!("{:<8} {}@{}", task, source.model_id, source.revision),
    }
}

async fn fetch(config: &AppConfig) -> Result<()> {
    let adapter = build_adapter(config);
    let handles = adapter.manager().preload().await?;
    for handle in handles {
        println!(
            "✅ {:<8} {} on {}",
            handle.task.as_str(),
            handle.model_id,
            handle.device
        );
    }
    Ok(())
}
