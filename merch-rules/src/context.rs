use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use merch_protocol::params;
use merch_protocol::product::CATEGORY_SEPARATOR;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigurationError;

/// Type of page being served.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Search,
    Category,
    Rule,
    Other,
}

impl PageType {
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(PageType::Search),
            "category" => Ok(PageType::Category),
            "rule" => Ok(PageType::Rule),
            "other" => Ok(PageType::Other),
            _ => Err(ConfigurationError::UnknownPageType(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Search => "search",
            PageType::Category => "category",
            PageType::Rule => "rule",
            PageType::Other => "other",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw request parameters as received from the search layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleParams {
    #[serde(
        default,
        rename = "rule",
        deserialize_with = "bool_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub rule: Option<String>,
    #[serde(default, rename = "pageType", skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(
        default,
        rename = "siteId",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub site_ids: Vec<String>,
    #[serde(default, rename = "catalogId", skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    #[serde(default, rename = "categoryPath", skip_serializing_if = "Option::is_none")]
    pub category_path: Option<String>,
    #[serde(default, rename = "path", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl RuleParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, enabled: impl Into<String>) -> Self {
        self.rule = Some(enabled.into());
        self
    }

    pub fn page_type(mut self, page_type: impl Into<String>) -> Self {
        self.page_type = Some(page_type.into());
        self
    }

    pub fn site(mut self, site_id: impl Into<String>) -> Self {
        self.site_ids.push(site_id.into());
        self
    }

    pub fn catalog(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }

    pub fn category_path(mut self, category_path: impl Into<String>) -> Self {
        self.category_path = Some(category_path.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

fn bool_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => Some(value.to_string()),
        Some(Flag::Text(value)) => Some(value),
        None => None,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => value.split(',').map(str::to_string).collect(),
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// Read-only snapshot of the targeting dimensions of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    rule_enabled: bool,
    page_type: PageType,
    site_ids: BTreeSet<String>,
    catalog_id: Option<String>,
    category_path: Vec<String>,
    path: Option<String>,
    requested_at: DateTime<Utc>,
}

impl RuleContext {
    /// Builds the context for a request arriving now.
    pub fn from_params(params: &RuleParams) -> Result<Self, ConfigurationError> {
        Self::from_params_at(params, Utc::now())
    }

    /// Builds the context with an explicit request time.
    pub fn from_params_at(
        params: &RuleParams,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, ConfigurationError> {
        let rule_enabled = match params.rule.as_deref() {
            None => true,
            Some(raw) => parse_flag(params::RULE, raw)?,
        };

        let page_type = match params.page_type.as_deref() {
            None => PageType::Other,
            Some(raw) => PageType::parse(raw)?,
        };

        let mut site_ids = BTreeSet::new();
        for site_id in &params.site_ids {
            let trimmed = site_id.trim();
            if trimmed.is_empty() {
                return Err(ConfigurationError::EmptyValue {
                    param: params::SITE_IDS,
                });
            }
            site_ids.insert(trimmed.to_string());
        }

        let catalog_id = match params.catalog_id.as_deref().map(str::trim) {
            None => None,
            Some("") => {
                return Err(ConfigurationError::EmptyValue {
                    param: params::CATALOG_ID,
                })
            }
            Some(value) => Some(value.to_string()),
        };

        let category_path = match params.category_path.as_deref() {
            None => Vec::new(),
            Some(raw) => parse_category_path(raw)?,
        };

        let path = params
            .path
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self {
            rule_enabled,
            page_type,
            site_ids,
            catalog_id,
            category_path,
            path,
            requested_at,
        })
    }

    pub fn rule_enabled(&self) -> bool {
        self.rule_enabled
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    pub fn site_ids(&self) -> &BTreeSet<String> {
        &self.site_ids
    }

    pub fn catalog_id(&self) -> Option<&str> {
        self.catalog_id.as_deref()
    }

    pub fn category_path(&self) -> &[String] {
        &self.category_path
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}

fn parse_flag(param: &'static str, raw: &str) -> Result<bool, ConfigurationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::InvalidFlag {
            param,
            value: raw.to_string(),
        }),
    }
}

fn parse_category_path(raw: &str) -> Result<Vec<String>, ConfigurationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(CATEGORY_SEPARATOR)
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                Err(ConfigurationError::EmptyCategoryToken {
                    path: raw.to_string(),
                })
            } else {
                Ok(token.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_parameters_are_absent() {
        let context = RuleContext::from_params(&RuleParams::new()).expect("context");
        assert!(context.rule_enabled());
        assert_eq!(context.page_type(), PageType::Other);
        assert!(context.site_ids().is_empty());
        assert!(context.catalog_id().is_none());
        assert!(context.category_path().is_empty());
    }

    #[test]
    fn splits_category_path_into_tokens() {
        let params = RuleParams::new()
            .page_type("Category")
            .category_path("men.shoes.running");
        let context = RuleContext::from_params(&params).expect("context");
        assert_eq!(context.page_type(), PageType::Category);
        assert_eq!(context.category_path(), ["men", "shoes", "running"]);
    }

    #[test]
    fn rejects_malformed_parameters() {
        let err = RuleContext::from_params(&RuleParams::new().category_path("men..shoes"));
        assert!(matches!(err, Err(ConfigurationError::EmptyCategoryToken { .. })));

        let err = RuleContext::from_params(&RuleParams::new().page_type("landing"));
        assert_eq!(
            err,
            Err(ConfigurationError::UnknownPageType("landing".into()))
        );

        let err = RuleContext::from_params(&RuleParams::new().rule("maybe"));
        assert!(matches!(err, Err(ConfigurationError::InvalidFlag { param: "rule", .. })));

        let err = RuleContext::from_params(&RuleParams::new().site(" "));
        assert!(matches!(err, Err(ConfigurationError::EmptyValue { param: "siteId" })));
    }

    #[test]
    fn reads_wire_parameter_names() {
        let params: RuleParams = serde_json::from_value(json!({
            "rule": "false",
            "pageType": "search",
            "siteId": "outdoor,bike",
            "catalogId": "outdoorCatalog",
            "categoryPath": "men.jackets",
            "path": "/sale"
        }))
        .expect("params");

        let context = RuleContext::from_params(&params).expect("context");
        assert!(!context.rule_enabled());
        assert_eq!(context.site_ids().len(), 2);
        assert_eq!(context.catalog_id(), Some("outdoorCatalog"));
        assert_eq!(context.path(), Some("/sale"));

        let native: RuleParams =
            serde_json::from_value(json!({"rule": false})).expect("boolean flag");
        assert_eq!(native.rule.as_deref(), Some("false"));
        assert!(!RuleContext::from_params(&native).expect("context").rule_enabled());
        let enabled: RuleParams =
            serde_json::from_value(json!({"rule": true})).expect("boolean flag");
        assert!(RuleContext::from_params(&enabled).expect("context").rule_enabled());

        let listed: RuleParams =
            serde_json::from_value(json!({"siteId": ["outdoor"]})).expect("params");
        assert_eq!(listed.site_ids, vec!["outdoor".to_string()]);
    }
}
