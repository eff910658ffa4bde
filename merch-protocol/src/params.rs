//! Request parameter names understood by the rule manager.
//!
//! These names are part of the wire contract with the calling search layer.

/// Whether the rule component is enabled. `rule=false` disables the rule manager for the request.
pub const RULE: &str = "rule";

/// Type of page being served (search, category, rule).
pub const PAGE_TYPE: &str = "pageType";

/// List of site ids to which rules should apply.
pub const SITE_IDS: &str = "siteId";

/// Catalog currently being searched.
pub const CATALOG_ID: &str = "catalogId";

/// Current category path when browsing. Rules can target specific categories.
pub const CATEGORY_PATH: &str = "categoryPath";

/// Current path when browsing.
pub const PATH: &str = "path";
