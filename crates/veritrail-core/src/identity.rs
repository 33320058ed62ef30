//! Trail identity.
//!
//! A trail is the named configuration describing where audit logs and
//! digests for an account/region are delivered. Every digest key and key
//! pattern is derived from this identity, so it is built once (from an ARN
//! or explicit parameters) and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Identity of a trail whose digest chain is being validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailIdentity {
    /// Account that owns the trail.
    pub account_id: String,
    /// Trail name (the resource part of the ARN).
    pub trail_name: String,
    /// Region the trail configuration lives in.
    pub home_region: String,
    /// Region the digests were delivered from. Equals `home_region` unless
    /// the trail aggregates multiple regions.
    pub source_region: String,
}

impl TrailIdentity {
    /// Create a trail identity. The source region defaults to the home
    /// region.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        trail_name: impl Into<String>,
        home_region: impl Into<String>,
    ) -> Self {
        let home_region = home_region.into();
        Self {
            account_id: account_id.into(),
            trail_name: trail_name.into(),
            source_region: home_region.clone(),
            home_region,
        }
    }

    /// Override the source region (multi-region aggregating trails).
    #[must_use]
    pub fn with_source_region(mut self, source_region: impl Into<String>) -> Self {
        self.source_region = source_region.into();
        self
    }

    /// Parse a trail identity from an ARN of the form
    /// `arn:{partition}:cloudtrail:{region}:{account}:trail/{name}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTrailArn`] if the ARN is malformed.
    pub fn from_arn(arn: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        let [_, partition, service, region, account, resource] = parts.as_slice() else {
            return Err(CoreError::InvalidTrailArn(arn.to_string()));
        };

        if !arn.starts_with("arn:") || partition.is_empty() || *service != "cloudtrail" {
            return Err(CoreError::InvalidTrailArn(arn.to_string()));
        }

        let name = resource
            .strip_prefix("trail/")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CoreError::InvalidTrailArn(arn.to_string()))?;

        if region.is_empty() || account.is_empty() {
            return Err(CoreError::InvalidTrailArn(arn.to_string()));
        }

        Ok(Self::new(*account, name, *region))
    }
}

impl std::fmt::Display for TrailIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ({})",
            self.account_id, self.trail_name, self.home_region
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arn() {
        let trail =
            TrailIdentity::from_arn("arn:aws:cloudtrail:us-east-1:123456789012:trail/my-trail")
                .unwrap();

        assert_eq!(trail.account_id, "123456789012");
        assert_eq!(trail.trail_name, "my-trail");
        assert_eq!(trail.home_region, "us-east-1");
        assert_eq!(trail.source_region, "us-east-1");
    }

    #[test]
    fn test_source_region_override() {
        let trail = TrailIdentity::new("123456789012", "agg", "us-east-1")
            .with_source_region("eu-west-1");

        assert_eq!(trail.home_region, "us-east-1");
        assert_eq!(trail.source_region, "eu-west-1");
    }

    #[test]
    fn test_from_arn_rejects_malformed() {
        for arn in [
            "",
            "not-an-arn",
            "arn:aws:s3:::bucket",
            "arn:aws:cloudtrail:us-east-1:123456789012:trail/",
            "arn:aws:cloudtrail:us-east-1:123456789012:snapshot/my-trail",
            "arn:aws:cloudtrail::123456789012:trail/my-trail",
        ] {
            assert!(TrailIdentity::from_arn(arn).is_err(), "accepted: {arn}");
        }
    }
}
