//! Log group selection: a region, then a log group within it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stepwise::{PickItem, PromptEnv, Submenu, SubmenuChoice};

/// The answer of the log group picker: `key` is the region id, `item` the
/// log group name.
pub type LogGroupChoice = SubmenuChoice<String, String>;

/// A cloud region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub name: String,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Where regions and their log groups come from.
#[async_trait]
pub trait LogGroupSource: Send + Sync {
    /// Regions offered on the first tier, in display order.
    fn regions(&self) -> Vec<Region>;

    /// Log group names in `region`.
    async fn log_groups(&self, region: &str) -> anyhow::Result<Vec<String>>;
}

/// An in-memory `LogGroupSource`.
#[derive(Debug, Clone, Default)]
pub struct StaticLogGroups {
    regions: Vec<Region>,
    groups: BTreeMap<String, Vec<String>>,
    latency: Option<Duration>,
}

impl StaticLogGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region<I, S>(mut self, region: Region, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .insert(region.id.clone(), groups.into_iter().map(Into::into).collect());
        self.regions.push(region);
        self
    }

    /// Delay every lookup, to make loading visible.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// A few regions with lambda log groups, for demos.
    pub fn sample() -> Self {
        Self::new()
            .with_region(
                Region::new("us-east-1", "US East (N. Virginia)"),
                [
                    "/aws/lambda/orders-api",
                    "/aws/lambda/orders-worker",
                    "/aws/lambda/payments",
                ],
            )
            .with_region(
                Region::new("eu-west-1", "Europe (Ireland)"),
                ["/aws/lambda/orders-api", "/aws/lambda/thumbnailer"],
            )
            .with_region(
                Region::new("ap-southeast-2", "Asia Pacific (Sydney)"),
                Vec::<String>::new(),
            )
    }
}

#[async_trait]
impl LogGroupSource for StaticLogGroups {
    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    async fn log_groups(&self, region: &str) -> anyhow::Result<Vec<String>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.groups.get(region) {
            Some(groups) => Ok(groups.clone()),
            None => anyhow::bail!("Unknown region {region}"),
        }
    }
}

/// Region list, then the log groups of the chosen region.
///
/// Groups are fetched every time a region is opened. A region without log
/// groups shows the "no items" entry, which leads back to the region list.
pub fn log_group_prompter(
    env: &PromptEnv,
    source: Arc<dyn LogGroupSource>,
) -> Submenu<String, String> {
    let regions = source
        .regions()
        .into_iter()
        .map(|region| PickItem::new(region.name, region.id.clone()).with_description(region.id))
        .collect();

    Submenu::with_lookup(env, "Log group", regions, move |region: String| {
        let source = Arc::clone(&source);
        async move {
            let groups = source.log_groups(&region).await?;
            tracing::debug!(%region, count = groups.len(), "Fetched log groups");
            Ok(groups.into_iter().map(PickItem::label).collect())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_groups_by_region() {
        let groups = StaticLogGroups::sample();

        assert_eq!(groups.regions().len(), 3);
        assert_eq!(
            groups.log_groups("eu-west-1").await.unwrap(),
            vec!["/aws/lambda/orders-api", "/aws/lambda/thumbnailer"]
        );
        assert!(groups.log_groups("ap-southeast-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_region_is_an_error() {
        let err = StaticLogGroups::sample().log_groups("mars-1").await.unwrap_err();

        assert_eq!(err.to_string(), "Unknown region mars-1");
    }
}
