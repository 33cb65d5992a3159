// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to Layer 2. Console
// text (prompts, translations, farewell) is written here and in
// repl.rs; everything else goes through tracing.
//
//   train      → TrainUseCase
//   translate  → TranslateUseCase::from_checkpoint → REPL or one-shot
//   run        → TrainUseCase → TranslateUseCase::from_trained → REPL

pub mod commands;
pub mod repl;

use anyhow::Result;
use clap::Parser;
use std::io;

use commands::{Commands, RunArgs, TrainArgs, TranslateArgs};
use crate::application::{
    train_use_case::TrainUseCase,
    translate_use_case::TranslateUseCase,
};
use crate::domain::traits::Translator;
use crate::ml::InferBackend;

#[derive(Parser, Debug)]
#[command(
    name = "shakespeare-translator",
    version = "0.1.0",
    about = "Fine-tune GPT-2 on modern/Shakespearean pairs, then translate."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
            Commands::Run(args)       => run_end_to_end(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Fine-tuning on '{}'", args.data_path);
    let output_dir = args.output_dir.clone();

    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoints saved to '{}'.", output_dir);
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    let translator = TranslateUseCase::<InferBackend>::from_checkpoint(
        &args.output_dir,
        args.generation.into(),
        burn::backend::wgpu::WgpuDevice::default(),
    )?;

    match args.sentence {
        Some(sentence) => {
            println!("Shakespearean: {}", translator.translate(&sentence)?);
            Ok(())
        }
        None => interactive(&translator),
    }
}

fn run_end_to_end(args: RunArgs) -> Result<()> {
    let trained    = TrainUseCase::new(args.train.into()).execute()?;
    let translator = TranslateUseCase::from_trained(trained, args.generation.into())?;
    interactive(&translator)
}

fn interactive(translator: &impl Translator) -> Result<()> {
    let stdin  = io::stdin();
    let stdout = io::stdout();
    repl::run_repl(stdin.lock(), stdout.lock(), translator)
}
