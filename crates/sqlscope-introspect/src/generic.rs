//! Generic fallback strategy
//!
//! Unknown dialects (and Oracle, which has no supported grammar or catalog
//! mapping here) introspect to an empty schema with the reason on record.
//! Returning empty instead of erroring keeps the browsing UI functional
//! against engines the catalog layer does not know.

use async_trait::async_trait;
use sqlscope_core::{Connection, Dialect, SchemaInfo};

use crate::strategy::{IntrospectContext, IntrospectionLog};
use crate::IntrospectionStrategy;

pub struct GenericStrategy;

#[async_trait]
impl IntrospectionStrategy for GenericStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }

    async fn introspect(
        &self,
        _conn: &dyn Connection,
        _ctx: &IntrospectContext,
        log: &mut IntrospectionLog,
    ) -> SchemaInfo {
        log.note("no catalog mapping for this dialect; returning empty schema");
        SchemaInfo::default()
    }
}
