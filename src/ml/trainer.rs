// ============================================================
// Layer 5 — Fine-Tuning Loop
// ============================================================
// Plain epoch/batch loop over Burn's DataLoader with AdamW.
//
//   for epoch in 1..=epochs:
//     train:  forward_loss → backward → clip ‖g‖ ≤ 1 → AdamW step
//     eval:   model.valid() on the inner backend (no autodiff,
//             dropout off) → mean loss, perplexity = exp(loss)
//     save:   checkpoint-{epoch}, then drop all but the newest N
//
// The binary trains on TrainBackend (Autodiff<Wgpu>); model.valid()
// returns the model on the inner backend, so the eval loader
// batches onto B::InnerBackend too.

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::CausalLmBatcher, dataset::CausalLmDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::Gpt2Model;

/// Fine-tune `model` and return the final weights on the inner backend.
pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model:         Gpt2Model<B>,
    train_dataset: CausalLmDataset,
    eval_dataset:  CausalLmDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<Gpt2Model<B::InnerBackend>> {
    if eval_dataset.is_empty() {
        tracing::warn!("Eval split is empty; eval loss will be reported as NaN");
    }

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay as f32)
        .with_epsilon(1e-8)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(1.0)))
        .init::<B, Gpt2Model<B>>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::<B, _, _>::new(CausalLmBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(train_dataset);

    // ── Eval data loader (InnerBackend, no autodiff overhead) ─────────────────
    let eval_loader = DataLoaderBuilder::<B::InnerBackend, _, _>::new(CausalLmBatcher::new())
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .set_device(device.clone())
        .build(eval_dataset);

    let mut model     = model;
    let mut best_eval = f64::INFINITY;

    println!("{:>5} | {:>10} | {:>10} | {:>10}", "epoch", "train_loss", "eval_loss", "perplexity");

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);

            tracing::debug!("epoch {} batch {} done", epoch, train_batches);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Eval phase ────────────────────────────────────────────────────────
        let model_valid: Gpt2Model<B::InnerBackend> = model.valid();

        let mut eval_loss_sum = 0.0f64;
        let mut eval_batches  = 0usize;

        for batch in eval_loader.iter() {
            let loss = model_valid.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);
            eval_loss_sum += loss.into_scalar().elem::<f64>();
            eval_batches  += 1;
        }

        let avg_eval_loss = if eval_batches > 0 {
            eval_loss_sum / eval_batches as f64
        } else { f64::NAN };

        let row = EpochMetrics::new(epoch, avg_train_loss, avg_eval_loss);
        println!(
            "{:>5} | {:>10.4} | {:>10.4} | {:>10.2}",
            row.epoch, row.train_loss, row.eval_loss, row.perplexity,
        );
        tracing::info!(
            "Epoch {}/{}: train_loss={:.4} eval_loss={:.4} perplexity={:.2}",
            epoch, cfg.epochs, row.train_loss, row.eval_loss, row.perplexity,
        );
        if row.is_improvement(best_eval) {
            best_eval = row.eval_loss;
            tracing::info!("New best eval loss: {:.4}", best_eval);
        }
        metrics.log(&row)?;

        let evicted = ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {} ({} evicted)", epoch, evicted.len());
    }

    tracing::info!("Training complete!");
    Ok(model.valid())
}
