//! Table reference resolution against the known table directory

use sqlyard_core::{DEFAULT_SCHEMA, TableDescriptor, unquote_identifier};

/// Read-only view over the tables known for a connection
#[derive(Debug, Clone, Copy)]
pub struct TableDirectory<'a> {
    tables: &'a [TableDescriptor],
    default_schema: &'a str,
}

impl<'a> TableDirectory<'a> {
    pub fn new(tables: &'a [TableDescriptor]) -> Self {
        Self {
            tables,
            default_schema: DEFAULT_SCHEMA,
        }
    }

    /// Namespace preferred when a bare name is ambiguous
    pub fn with_default_schema(mut self, default_schema: &'a str) -> Self {
        self.default_schema = default_schema;
        self
    }

    pub fn tables(&self) -> &'a [TableDescriptor] {
        self.tables
    }

    /// Name shown for a table: bare inside the default namespace
    pub fn display_name(&self, table: &TableDescriptor) -> String {
        table.display_name_in(self.default_schema)
    }

    /// Resolve a (possibly quoted, possibly schema-qualified) reference.
    ///
    /// A bare name wins when exactly one table carries it. When several do,
    /// the one in the default namespace (or without a schema) is taken.
    /// `schema.name` references match qualified and display names only.
    pub fn resolve(&self, reference: &str) -> Option<&'a TableDescriptor> {
        let reference = unquote_identifier(reference);
        if reference.is_empty() {
            return None;
        }

        if reference.contains('.') {
            return unique(self.tables.iter().filter(|t| {
                t.qualified_name().eq_ignore_ascii_case(&reference)
                    || self.display_name(t).eq_ignore_ascii_case(&reference)
            }));
        }

        let by_name: Vec<&TableDescriptor> = self
            .tables
            .iter()
            .filter(|t| t.name.eq_ignore_ascii_case(&reference))
            .collect();

        match by_name.as_slice() {
            [] => None,
            [only] => Some(*only),
            several => {
                let resolved = unique(several.iter().copied().filter(|t| self.is_default(t)))
                    .or_else(|| {
                        unique(
                            several
                                .iter()
                                .copied()
                                .filter(|t| self.display_name(t).eq_ignore_ascii_case(&reference)),
                        )
                    });
                if resolved.is_none() {
                    tracing::debug!(reference = %reference, candidates = several.len(), "ambiguous table reference");
                }
                resolved
            }
        }
    }

    /// True when another known table shares this table's bare name
    pub fn is_name_shared(&self, table: &TableDescriptor) -> bool {
        self.tables
            .iter()
            .filter(|t| t.name.eq_ignore_ascii_case(&table.name))
            .count()
            > 1
    }

    fn is_default(&self, table: &TableDescriptor) -> bool {
        table.in_schema(self.default_schema)
    }
}

fn unique<'a>(mut matches: impl Iterator<Item = &'a TableDescriptor>) -> Option<&'a TableDescriptor> {
    let first = matches.next()?;
    match matches.next() {
        None => Some(first),
        Some(_) => None,
    }
}
