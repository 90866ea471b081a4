//! Run-wide lowering state.

use rustc_hash::FxHashMap;
use slang_ir::{Id, IdGen};

use crate::classes::ClassLayout;
use crate::enums::EnumLayout;
use crate::runtime::Runtime;

/// State shared by every phase of one compilation run.
///
/// Phases that replace a definition record the replacement here, keyed by
/// the replaced definition's id, so later modules (and later steps of the
/// same phase) can rewrite their uses.
pub struct LoweringContext<'a> {
    pub(crate) ids: &'a IdGen,
    pub(crate) runtime: Runtime,
    pub(crate) enums: FxHashMap<Id, EnumLayout>,
    pub(crate) classes: FxHashMap<Id, ClassLayout>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(ids: &'a IdGen, runtime: Runtime) -> Self {
        LoweringContext {
            ids,
            runtime,
            enums: FxHashMap::default(),
            classes: FxHashMap::default(),
        }
    }
}
