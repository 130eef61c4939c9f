use crate::error::{CodecError, CodecResult};
use crate::mode::{FieldKind, ReferenceMode};
use crate::reference::Resolver;

/// Everything the codec needs to know about the field it is working on.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    /// The name the field is serialized under.
    pub field: &'a str,
    pub mode: ReferenceMode,
    pub resolver: &'a dyn Resolver,
}

impl<'a> FieldContext<'a> {
    pub fn new(field: &'a str, mode: ReferenceMode, resolver: &'a dyn Resolver) -> Self {
        Self {
            field,
            mode,
            resolver,
        }
    }

    /// Fail with a schema error unless `kind` may use this context's mode.
    pub fn require(&self, kind: FieldKind) -> CodecResult<()> {
        if kind.accepts(self.mode) {
            Ok(())
        } else {
            Err(CodecError::schema(
                self.field,
                format!("{kind} field cannot use {} mode", self.mode),
            ))
        }
    }
}

impl std::fmt::Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldContext")
            .field("field", &self.field)
            .field("mode", &self.mode)
            .finish()
    }
}
