//! Compiled-in plugin registry with priority dispatch
//!
//! Handlers register through an explicit builder list rather than being
//! discovered at runtime; a binary can extend the built-in list with its
//! own constructors before loading.

use crate::plugin::{GenericPlugin, MediaPlugin, PluginContext, YoutubePlugin};
use std::sync::Arc;
use tracing::{error, info};

/// Constructor for one plugin, given the shared context
pub type PluginBuilder =
    fn(&PluginContext) -> Result<Arc<dyn MediaPlugin>, crate::utils::MediaForgeError>;

/// The handlers shipped with the service
pub fn builtin_plugins() -> Vec<PluginBuilder> {
    vec![YoutubePlugin::build, GenericPlugin::build]
}

/// Priority-ordered set of loaded handlers
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn MediaPlugin>>,
}

impl PluginRegistry {
    /// Instantiate every builder with the shared context. A builder that
    /// fails is logged and skipped; one bad plugin never prevents the
    /// service from starting.
    pub fn load(ctx: &PluginContext, builders: &[PluginBuilder]) -> Self {
        let mut plugins: Vec<Arc<dyn MediaPlugin>> = Vec::new();

        for builder in builders {
            match builder(ctx) {
                Ok(plugin) => {
                    info!(
                        "Loaded plugin '{}' (priority {})",
                        plugin.name(),
                        plugin.priority()
                    );
                    plugins.push(plugin);
                }
                Err(e) => error!("Plugin load error: {}", e),
            }
        }

        // Stable sort: registration order breaks equal priorities
        plugins.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        Self { plugins }
    }

    /// First handler, in priority order, whose predicate matches.
    /// `None` is the normal "unsupported URL" outcome, not a fault.
    pub fn find_for_url(&self, url: &str) -> Option<Arc<dyn MediaPlugin>> {
        self.plugins.iter().find(|p| p.can_handle(url)).cloned()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MediaFetcher, OnProgress, ProbeReport};
    use crate::orchestrator::ProgressSender;
    use crate::pipeline::StreamMuxer;
    use crate::plugin::MediaInfo;
    use crate::task::{DownloadOutcome, DownloadRequest};
    use crate::utils::MediaForgeError;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct NullFetcher;

    #[async_trait]
    impl MediaFetcher for NullFetcher {
        async fn probe(&self, _url: &str) -> Result<ProbeReport, MediaForgeError> {
            Ok(ProbeReport::default())
        }

        async fn fetch(
            &self,
            _url: &str,
            _selector: &str,
            _dest: &Path,
            _on_progress: &OnProgress,
        ) -> Result<(), MediaForgeError> {
            Ok(())
        }
    }

    struct NullMuxer;

    #[async_trait]
    impl StreamMuxer for NullMuxer {
        async fn mux(
            &self,
            _video: &Path,
            _audio: &Path,
            _output: &Path,
        ) -> Result<(), MediaForgeError> {
            Ok(())
        }
    }

    fn context() -> PluginContext {
        PluginContext {
            download_root: PathBuf::from("/tmp/forge-test"),
            fetcher: std::sync::Arc::new(NullFetcher),
            muxer: std::sync::Arc::new(NullMuxer),
        }
    }

    struct FixedPlugin {
        name: &'static str,
        priority: i32,
        matches: bool,
    }

    #[async_trait]
    impl MediaPlugin for FixedPlugin {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn can_handle(&self, _url: &str) -> bool {
            self.matches
        }

        async fn extract_info(&self, _url: &str) -> Result<MediaInfo, MediaForgeError> {
            unimplemented!("dispatch tests never probe")
        }

        async fn download(
            &self,
            _task_id: &str,
            _request: &DownloadRequest,
            _progress: ProgressSender,
        ) -> Result<DownloadOutcome, MediaForgeError> {
            unimplemented!("dispatch tests never download")
        }
    }

    fn specific(_ctx: &PluginContext) -> Result<Arc<dyn MediaPlugin>, MediaForgeError> {
        Ok(Arc::new(FixedPlugin {
            name: "specific",
            priority: 10,
            matches: true,
        }))
    }

    fn catch_all(_ctx: &PluginContext) -> Result<Arc<dyn MediaPlugin>, MediaForgeError> {
        Ok(Arc::new(FixedPlugin {
            name: "catch-all",
            priority: 1,
            matches: true,
        }))
    }

    fn never_matches(_ctx: &PluginContext) -> Result<Arc<dyn MediaPlugin>, MediaForgeError> {
        Ok(Arc::new(FixedPlugin {
            name: "never",
            priority: 99,
            matches: false,
        }))
    }

    fn broken(_ctx: &PluginContext) -> Result<Arc<dyn MediaPlugin>, MediaForgeError> {
        Err(MediaForgeError::PluginLoad {
            plugin: "broken",
            message: "missing dependency".to_string(),
        })
    }

    #[test]
    fn test_higher_priority_wins_over_catch_all() {
        // Registration order deliberately reversed from priority order
        let registry = PluginRegistry::load(&context(), &[catch_all, specific]);

        let chosen = registry.find_for_url("https://example.com/clip").unwrap();
        assert_eq!(chosen.name(), "specific");
    }

    #[test]
    fn test_non_matching_high_priority_is_skipped() {
        let registry = PluginRegistry::load(&context(), &[never_matches, catch_all]);

        let chosen = registry.find_for_url("https://example.com/clip").unwrap();
        assert_eq!(chosen.name(), "catch-all");
    }

    #[test]
    fn test_no_handler_yields_none() {
        let registry = PluginRegistry::load(&context(), &[never_matches]);
        assert!(registry.find_for_url("https://example.com/clip").is_none());
    }

    #[test]
    fn test_broken_builder_is_skipped_not_fatal() {
        let registry = PluginRegistry::load(&context(), &[broken, catch_all]);

        assert_eq!(registry.len(), 1);
        let chosen = registry.find_for_url("https://example.com/clip").unwrap();
        assert_eq!(chosen.name(), "catch-all");
    }

    #[test]
    fn test_builtin_set_loads() {
        let registry = PluginRegistry::load(&context(), &builtin_plugins());
        assert_eq!(registry.len(), 2);

        // The specialized handler outranks the generic one
        let chosen = registry
            .find_for_url("https://youtube.com/watch?v=abc")
            .unwrap();
        assert_eq!(chosen.name(), "youtube");
    }
}
