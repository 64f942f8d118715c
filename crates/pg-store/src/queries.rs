//! Named SQL queries.
//!
//! Query text lives outside the binary in a single file of blocks, each
//! introduced by a `-- name: <query-name>` line:
//!
//! ```sql
//! -- name: token-details
//! SELECT ... WHERE contract_address = $1;
//! ```

use std::collections::HashMap;
use std::path::Path;

use ussd_core::StoreError;

/// Every query the store runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    Last10Tx,
    TokenHoldings,
    TokenDetails,
    PoolDetails,
    PoolReverseDetails,
    TopActivePools,
    PoolTokenAllowed,
    PoolAllowedTokensForUser,
    PoolAllowedTokens,
    PoolAllowedStables,
    PoolTokenSwapRates,
    PoolTokenLimit,
}

impl QueryName {
    pub const ALL: [QueryName; 12] = [
        Self::Last10Tx,
        Self::TokenHoldings,
        Self::TokenDetails,
        Self::PoolDetails,
        Self::PoolReverseDetails,
        Self::TopActivePools,
        Self::PoolTokenAllowed,
        Self::PoolAllowedTokensForUser,
        Self::PoolAllowedTokens,
        Self::PoolAllowedStables,
        Self::PoolTokenSwapRates,
        Self::PoolTokenLimit,
    ];

    /// Name used in the query file
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last10Tx => "last-10-tx",
            Self::TokenHoldings => "token-holdings",
            Self::TokenDetails => "token-details",
            Self::PoolDetails => "pool-details",
            Self::PoolReverseDetails => "pool-reverse-details",
            Self::TopActivePools => "top-active-pools",
            Self::PoolTokenAllowed => "pool-token-allowed",
            Self::PoolAllowedTokensForUser => "pool-allowed-tokens-for-user",
            Self::PoolAllowedTokens => "pool-allowed-tokens",
            Self::PoolAllowedStables => "pool-allowed-stables",
            Self::PoolTokenSwapRates => "pool-token-swap-rates",
            Self::PoolTokenLimit => "pool-token-limit",
        }
    }
}

const NAME_TAG: &str = "-- name:";

/// The full set of query texts, validated at load time
#[derive(Debug, Clone)]
pub struct Queries {
    texts: HashMap<QueryName, String>,
}

impl Queries {
    /// Read and parse a query file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::QueryFile {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        raw.parse()
    }

    /// Query text for `name`
    pub fn get(&self, name: QueryName) -> &str {
        self.texts.get(&name).map(String::as_str).unwrap_or_default()
    }
}

impl std::str::FromStr for Queries {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let blocks = parse_blocks(raw)?;

        let mut texts = HashMap::with_capacity(QueryName::ALL.len());
        for name in QueryName::ALL {
            let text = blocks
                .get(name.as_str())
                .ok_or_else(|| StoreError::MissingQuery {
                    name: name.as_str().to_string(),
                })?;
            texts.insert(name, text.clone());
        }

        let unknown: Vec<&str> = blocks
            .keys()
            .map(String::as_str)
            .filter(|key| !QueryName::ALL.iter().any(|name| name.as_str() == *key))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(?unknown, "ignoring unknown queries");
        }

        Ok(Self { texts })
    }
}

/// Split raw text into named blocks
fn parse_blocks(raw: &str) -> Result<HashMap<String, String>, StoreError> {
    let mut blocks: HashMap<String, String> = HashMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    let mut finish = |current: Option<(String, Vec<&str>)>| -> Result<(), StoreError> {
        if let Some((name, lines)) = current {
            let text = lines.join("\n").trim().to_string();
            if text.is_empty() {
                return Err(StoreError::QueryFile {
                    message: format!("query {} is empty", name),
                });
            }
            if blocks.insert(name.clone(), text).is_some() {
                return Err(StoreError::QueryFile {
                    message: format!("query {} is defined twice", name),
                });
            }
        }
        Ok(())
    };

    for line in raw.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix(NAME_TAG) {
            finish(current.take())?;
            current = Some((name.trim().to_string(), Vec::new()));
        } else if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        } else {
            return Err(StoreError::QueryFile {
                message: format!("statement outside a named block: {}", trimmed),
            });
        }
    }
    finish(current.take())?;

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_file() -> String {
        QueryName::ALL
            .iter()
            .map(|name| format!("-- name: {}\nSELECT '{}';\n", name.as_str(), name.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_named_blocks() {
        let raw = "\
-- name: token-details
-- Token metadata by contract address
SELECT token_name, token_symbol
FROM tokens
WHERE contract_address = $1;

-- name: pool-details
SELECT * FROM pools WHERE contract_address = $1;
";
        let blocks = parse_blocks(raw).unwrap();
        assert_eq!(
            blocks["token-details"],
            "SELECT token_name, token_symbol\nFROM tokens\nWHERE contract_address = $1;"
        );
        assert_eq!(
            blocks["pool-details"],
            "SELECT * FROM pools WHERE contract_address = $1;"
        );
    }

    #[test]
    fn test_all_queries_loaded() {
        let queries: Queries = full_file().parse().unwrap();
        assert_eq!(queries.get(QueryName::PoolTokenLimit), "SELECT 'pool-token-limit';");
        assert_eq!(queries.get(QueryName::Last10Tx), "SELECT 'last-10-tx';");
    }

    #[test]
    fn test_missing_query_fails() {
        let raw = full_file().replace("-- name: pool-token-limit", "-- name: pool-token-limits");
        match raw.parse::<Queries>() {
            Err(StoreError::MissingQuery { name }) => assert_eq!(name, "pool-token-limit"),
            other => panic!("expected MissingQuery, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_query_fails() {
        let raw = format!("{}\n-- name: last-10-tx\nSELECT 1;", full_file());
        assert!(matches!(
            raw.parse::<Queries>(),
            Err(StoreError::QueryFile { .. })
        ));
    }

    #[test]
    fn test_statement_before_first_name_fails() {
        let raw = format!("SELECT 1;\n{}", full_file());
        assert!(matches!(
            raw.parse::<Queries>(),
            Err(StoreError::QueryFile { .. })
        ));
    }

    #[test]
    fn test_bundled_query_file_is_complete() {
        let raw = include_str!("../../../queries.sql");
        let queries: Queries = raw.parse().unwrap();
        assert!(queries.get(QueryName::PoolTokenSwapRates).contains("$3"));
    }
}
