//! Shader program handle
//!
//! Compilation and linking happen elsewhere; this crate only needs to make a
//! linked program current and feed it uniforms.

use crate::render::context::{ProgramHandle, SharedContext, UniformValue};

/// Non-owning reference to a linked program
#[derive(Clone)]
pub struct ShaderProgram {
    ctx: SharedContext,
    handle: ProgramHandle,
}

impl ShaderProgram {
    /// Wrap an already linked program
    pub fn new(ctx: SharedContext, handle: ProgramHandle) -> Self {
        Self { ctx, handle }
    }

    /// Make this program current
    pub fn bind(&self) {
        self.ctx.use_program(Some(self.handle));
    }

    /// Clear the current program
    pub fn unbind(&self) {
        self.ctx.use_program(None);
    }

    /// Set a uniform; the program must be bound
    pub fn set_uniform(&self, name: &str, value: UniformValue) {
        self.ctx.set_uniform(self.handle, name, value);
    }

    /// Program handle
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram").field("handle", &self.handle).finish()
    }
}
