use std::fmt;

use crate::foundation::error::{ReelError, ReelResult};

/// Named stream inside one compiled graph, rendered as `[name]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// Per-job step counter. Every intermediate label is derived from it, so two labels handed out
/// by the same allocator never collide.
///
/// One allocator is owned per compilation and threaded through the effects and overlay
/// compilers in order.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    step: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new step.
    pub fn next_step(&mut self) -> u32 {
        self.step += 1;
        self.step
    }

    /// Last step handed out (0 before the first call).
    pub fn current(&self) -> u32 {
        self.step
    }

    /// `<prefix><step>` for an already-advanced step.
    pub fn at(prefix: &str, step: u32) -> Label {
        Label::new(format!("{prefix}{step}"))
    }

    /// Advance and build `<prefix><step>`.
    pub fn next(&mut self, prefix: &str) -> Label {
        let step = self.next_step();
        Self::at(prefix, step)
    }
}

/// Reference to a stream of an encoder input, e.g. input 2's audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamRef {
    pub input: usize,
    pub kind: char,
}

impl StreamRef {
    pub fn video(input: usize) -> Self {
        Self { input, kind: 'v' }
    }

    pub fn audio(input: usize) -> Self {
        Self { input, kind: 'a' }
    }

    /// Bare specifier, usable directly as a `-map` target: `2:a`.
    pub fn specifier(self) -> String {
        format!("{}:{}", self.input, self.kind)
    }

    /// Graph input pad: `[2:a]`.
    pub fn pad(self) -> String {
        format!("[{}:{}]", self.input, self.kind)
    }
}

/// Symbolic reference to the `slot`-th extra input of a fragment, resolved once all inputs
/// are known.
pub fn placeholder(slot: usize) -> String {
    format!("[#{slot}:v]")
}

/// Replace every `[#k:v]` with `[offset+k:v]`.
///
/// Fails when a slot is not backed by one of the `slots` extra inputs or a placeholder is
/// malformed; both mean the chain and its input list went out of sync.
pub fn resolve_placeholders(chain: &str, offset: usize, slots: usize) -> ReelResult<String> {
    let mut out = String::with_capacity(chain.len());
    let mut rest = chain;
    while let Some(pos) = rest.find("[#") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        let end = after.find(":v]").ok_or_else(|| {
            ReelError::validation(format!("malformed input placeholder in '{chain}'"))
        })?;
        let slot: usize = after[..end].parse().map_err(|_| {
            ReelError::validation(format!(
                "malformed input placeholder '[#{}:v]'",
                &after[..end]
            ))
        })?;
        if slot >= slots {
            return Err(ReelError::validation(format!(
                "input placeholder #{slot} has no matching extra input ({slots} attached)"
            )));
        }
        out.push_str(&StreamRef::video(offset + slot).pad());
        rest = &after[end + 3..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/graph/label.rs"]
mod tests;
