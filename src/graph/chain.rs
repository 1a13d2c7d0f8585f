use std::path::PathBuf;

use crate::graph::label::{Label, placeholder};

/// Builder for one linear filter chain plus the side inputs it pulls in.
///
/// Every stage reads the label the previous stage wrote. Extra inputs are referenced through
/// `[#k:v]` placeholders; `input_offset` records where the caller expects them to be attached.
#[derive(Clone, Debug)]
pub struct FilterChain {
    stages: Vec<String>,
    current: String,
    extra_inputs: Vec<PathBuf>,
    input_offset: usize,
}

impl FilterChain {
    /// Start a chain reading from `base` (`[0:v]`, `[vfx_3]`, ...).
    pub fn new(base: impl Into<String>, input_offset: usize) -> Self {
        Self {
            stages: Vec::new(),
            current: base.into(),
            extra_inputs: Vec::new(),
            input_offset,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// `<current><expr><out>`; `out` becomes current.
    pub fn then(&mut self, expr: &str, out: Label) {
        let out = out.to_string();
        self.stages.push(format!("{}{expr}{out}", self.current));
        self.current = out;
    }

    /// `<current><second><expr><out>` for two-input filters such as `overlay` and `blend`.
    pub fn merge(&mut self, second: &str, expr: &str, out: Label) {
        let out = out.to_string();
        self.stages
            .push(format!("{}{second}{expr}{out}", self.current));
        self.current = out;
    }

    /// `<input><expr><out>` on a side branch; current is untouched.
    pub fn side(&mut self, input: &str, expr: &str, out: &Label) {
        self.stages.push(format!("{input}{expr}{out}"));
    }

    /// Register an extra input file and return its placeholder pad.
    pub fn add_input(&mut self, path: impl Into<PathBuf>) -> String {
        self.extra_inputs.push(path.into());
        placeholder(self.extra_inputs.len() - 1)
    }

    pub fn finish(self) -> CompiledFragment {
        CompiledFragment {
            chain: self.stages.join(";"),
            output: self.current,
            extra_inputs: self.extra_inputs,
            input_offset: self.input_offset,
        }
    }
}

/// Output of one compiler: chain text, the label to continue from, and its extra inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledFragment {
    /// `;`-joined stages; empty when the compiler had nothing to do.
    pub chain: String,
    pub output: String,
    pub extra_inputs: Vec<PathBuf>,
    pub input_offset: usize,
}

impl CompiledFragment {
    /// A fragment that adds no stages and passes `base` through.
    pub fn passthrough(base: impl Into<String>, input_offset: usize) -> Self {
        FilterChain::new(base, input_offset).finish()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Labels written by this fragment, in order.
    pub fn written_labels(&self) -> Vec<&str> {
        self.chain
            .split(';')
            .filter_map(|stage| {
                let stage = stage.strip_suffix(']')?;
                let open = stage.rfind('[')?;
                Some(&stage[open + 1..])
            })
            .collect()
    }
}
