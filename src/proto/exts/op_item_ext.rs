use bytes::Bytes;

use crate::proto::op_item::Op;
use crate::proto::EmptyOp;
use crate::proto::OpItem;
use crate::proto::Ref;
use crate::proto::Set;
use crate::proto::Value;

impl Ref {
    pub fn new(
        set: Set,
        path: impl Into<String>,
    ) -> Self {
        Self {
            set: set.into(),
            path: path.into(),
        }
    }
}

impl OpItem {
    /// Upsert `path` within `set` with an already encoded value.
    pub fn set_op(
        set: Set,
        path: impl Into<String>,
        bytes: Bytes,
    ) -> Self {
        Self {
            op: Some(Op::Set(Value {
                r#ref: Some(Ref::new(set, path)),
                bytes,
            })),
        }
    }

    pub fn delete_op(
        set: Set,
        path: impl Into<String>,
    ) -> Self {
        Self {
            op: Some(Op::Delete(Ref::new(set, path))),
        }
    }

    pub fn sync() -> Self {
        Self {
            op: Some(Op::Sync(EmptyOp {})),
        }
    }

    pub fn is_sync(&self) -> bool {
        matches!(self.op, Some(Op::Sync(_)))
    }

    /// The partition and path this op targets; `None` for sync markers.
    pub fn target(&self) -> Option<(Set, &str)> {
        let r = match &self.op {
            Some(Op::Set(value)) => value.r#ref.as_ref()?,
            Some(Op::Delete(r)) => r,
            Some(Op::Sync(_)) | None => return None,
        };
        Some((r.set(), r.path.as_str()))
    }

    /// Short op name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self.op {
            Some(Op::Set(_)) => "set",
            Some(Op::Delete(_)) => "delete",
            Some(Op::Sync(_)) => "sync",
            None => "none",
        }
    }
}
