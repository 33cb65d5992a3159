// ============================================================
// Layer 5 — GPT-2 Causal Language Model (Burn)
// ============================================================
// Decoder-only transformer with the GPT-2 layout, so pretrained
// hub weights map onto it one tensor at a time (see ml::import):
//
//   wte + wpe ─► dropout ─► [ Block × n_layer ] ─► ln_f ─► x·wteᵀ
//
//   Block:  x + attn(ln_1(x))   then   x + mlp(ln_2(x))
//
// The LM head is tied to the token embedding, as in GPT-2.
// Linear weights are [d_in, d_out], which is also how GPT-2's
// Conv1D stores them, so no transposes are needed on import.

use burn::{
    module::Param,
    nn::{
        attention::generate_autoregressive_mask,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, softmax},
};

/// Score written into masked attention slots before the softmax.
const MASKED_SCORE: f32 = -1.0e9;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Gpt2Config {
    pub vocab_size:  usize,
    pub n_positions: usize,
    pub n_embd:      usize,
    pub n_layer:     usize,
    pub n_head:      usize,
    #[config(default = 1e-5)]
    pub layer_norm_epsilon: f64,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl Gpt2Config {
    /// Randomly initialised model. Pretrained weights are loaded on top.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Gpt2Model<B> {
        let wte = EmbeddingConfig::new(self.vocab_size, self.n_embd).init(device);
        let wpe = EmbeddingConfig::new(self.n_positions, self.n_embd).init(device);
        let blocks: Vec<Gpt2Block<B>> = (0..self.n_layer)
            .map(|_| self.build_block(device))
            .collect();
        let ln_f = LayerNorm::new(self.n_embd, self.layer_norm_epsilon, device);
        let embd_dropout = DropoutConfig::new(self.dropout).init();
        Gpt2Model {
            wte, wpe, blocks, ln_f, embd_dropout,
            n_positions: self.n_positions,
        }
    }

    fn build_block<B: Backend>(&self, device: &B::Device) -> Gpt2Block<B> {
        let d = self.n_embd;
        let attn = CausalSelfAttention {
            c_attn:       LinearConfig::new(d, 3 * d).init(device),
            c_proj:       LinearConfig::new(d, d).init(device),
            attn_dropout: DropoutConfig::new(self.dropout).init(),
            n_head:       self.n_head,
        };
        let mlp = Mlp {
            c_fc:   LinearConfig::new(d, 4 * d).init(device),
            c_proj: LinearConfig::new(4 * d, d).init(device),
        };
        Gpt2Block {
            ln_1: LayerNorm::new(d, self.layer_norm_epsilon, device),
            attn,
            ln_2: LayerNorm::new(d, self.layer_norm_epsilon, device),
            mlp,
            resid_dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

// ─── LayerNorm ────────────────────────────────────────────────────────────────
/// Layer normalisation over the last dimension with learned gamma/beta.
#[derive(Module, Debug)]
pub struct LayerNorm<B: Backend> {
    pub gamma: Param<Tensor<B, 1>>,
    pub beta:  Param<Tensor<B, 1>>,
    epsilon:   f64,
}

impl<B: Backend> LayerNorm<B> {
    pub fn new(d_model: usize, epsilon: f64, device: &B::Device) -> Self {
        Self {
            gamma: Param::from_tensor(Tensor::ones([d_model], device)),
            beta:  Param::from_tensor(Tensor::zeros([d_model], device)),
            epsilon,
        }
    }

    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let (var, mean) = x.clone().var_mean_bias(D - 1);
        let normed = (x - mean).div((var + self.epsilon).sqrt());
        normed * self.gamma.val().unsqueeze() + self.beta.val().unsqueeze()
    }
}

// ─── Attention ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct CausalSelfAttention<B: Backend> {
    /// Fused query/key/value projection: [d, 3d]
    pub c_attn:       Linear<B>,
    pub c_proj:       Linear<B>,
    pub attn_dropout: Dropout,
    n_head:           usize,
}

impl<B: Backend> CausalSelfAttention<B> {
    /// x: [batch, seq, d]; key_padding: [batch, seq], true = padded
    pub fn forward(
        &self,
        x:           Tensor<B, 3>,
        key_padding: Option<Tensor<B, 2, Bool>>,
    ) -> Tensor<B, 3> {
        let [batch, seq, d_model] = x.dims();
        let n_head   = self.n_head;
        let head_dim = d_model / n_head;

        let qkv = self.c_attn.forward(x);
        let heads = |i: usize| {
            qkv.clone()
                .slice([0..batch, 0..seq, i * d_model..(i + 1) * d_model])
                .reshape([batch, seq, n_head, head_dim])
                .swap_dims(1, 2)
        };
        let (q, k, v) = (heads(0), heads(1), heads(2)); // [batch, head, seq, head_dim]

        let scores = q.matmul(k.transpose()).div_scalar((head_dim as f64).sqrt());

        let causal = generate_autoregressive_mask::<B>(batch, seq, &scores.device())
            .reshape([batch, 1, seq, seq])
            .expand([batch, n_head, seq, seq]);
        let mut scores = scores.mask_fill(causal, MASKED_SCORE);

        if let Some(pad) = key_padding {
            let pad = pad
                .reshape([batch, 1, 1, seq])
                .expand([batch, n_head, seq, seq]);
            scores = scores.mask_fill(pad, MASKED_SCORE);
        }

        let weights = self.attn_dropout.forward(softmax(scores, 3));
        let context = weights
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch, seq, d_model]);

        self.c_proj.forward(context)
    }
}

// ─── MLP ──────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub c_fc:   Linear<B>,
    pub c_proj: Linear<B>,
}

impl<B: Backend> Mlp<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.c_proj.forward(gelu_new(self.c_fc.forward(x)))
    }
}

/// GPT-2's tanh approximation of GELU.
pub fn gelu_new<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    let k = (2.0 / std::f64::consts::PI).sqrt();
    let inner = (x.clone() + x.clone().powf_scalar(3.0) * 0.044715) * k;
    x * (inner.tanh() + 1.0) * 0.5
}

// ─── Block ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Gpt2Block<B: Backend> {
    pub ln_1:          LayerNorm<B>,
    pub attn:          CausalSelfAttention<B>,
    pub ln_2:          LayerNorm<B>,
    pub mlp:           Mlp<B>,
    pub resid_dropout: Dropout,
}

impl<B: Backend> Gpt2Block<B> {
    pub fn forward(&self, x: Tensor<B, 3>, key_padding: Option<Tensor<B, 2, Bool>>) -> Tensor<B, 3> {
        let attn_out = self.attn.forward(self.ln_1.forward(x.clone()), key_padding);
        let x = x + self.resid_dropout.forward(attn_out);
        let mlp_out = self.mlp.forward(self.ln_2.forward(x.clone()));
        x + self.resid_dropout.forward(mlp_out)
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Gpt2Model<B: Backend> {
    pub wte:          Embedding<B>,
    pub wpe:          Embedding<B>,
    pub blocks:       Vec<Gpt2Block<B>>,
    pub ln_f:         LayerNorm<B>,
    pub embd_dropout: Dropout,
    pub n_positions:  usize,
}

impl<B: Backend> Gpt2Model<B> {
    /// input_ids: [batch, seq] → logits: [batch, seq, vocab]
    ///
    /// `attention_mask` (1 = real, 0 = pad) keeps padded keys out
    /// of every query's attention. Pass `None` for unpadded input.
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Option<Tensor<B, 2, Int>>,
    ) -> Tensor<B, 3> {
        let [batch, seq] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq as i64, &device)
            .unsqueeze::<2>()
            .expand([batch, seq]);

        let tok_emb = self.wte.forward(input_ids);
        let pos_emb = self.wpe.forward(positions);
        let mut x = self.embd_dropout.forward(tok_emb + pos_emb);

        let key_padding = attention_mask.map(|m| m.equal_elem(0));
        for block in &self.blocks {
            x = block.forward(x, key_padding.clone());
        }
        let x = self.ln_f.forward(x);

        // Tied LM head: project onto the token embedding matrix.
        let [_, _, d_model] = x.dims();
        let wte = self.wte.weight.val();
        let [vocab, _] = wte.dims();
        x.reshape([batch * seq, d_model])
            .matmul(wte.transpose())
            .reshape([batch, seq, vocab])
    }

    /// Mean next-token cross-entropy over real tokens. Logits at t
    /// are scored against labels at t+1; targets under a 0 in the
    /// mask are left out of both the sum and the token count.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [batch, seq] = input_ids.dims();
        let logits = self.forward(input_ids, Some(attention_mask.clone()));
        let [_, _, vocab] = logits.dims();
        // Shifting needs at least one (input, next token) pair
        let n = batch * seq.saturating_sub(1);
        if n == 0 {
            return Tensor::zeros([1], &logits.device());
        }

        let log_probs = log_softmax(
            logits.slice([0..batch, 0..seq - 1, 0..vocab]).reshape([n, vocab]),
            1,
        );
        let targets = labels.slice([0..batch, 1..seq]).reshape([n, 1]);
        let real    = attention_mask.slice([0..batch, 1..seq]).reshape([n]).float();

        let nll = log_probs.gather(1, targets).reshape([n]).neg();
        let count = real.clone().sum().clamp_min(1.0);

        (nll * real).sum() / count
    }
}
