//! `ssg build` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use ssg_config::{CliSettings, Config};
use ssg_site::{
    ChainRenderer, Extensions, IndexPattern, NavOptions, Navigation, PartialHelper,
    ScaffoldOptions, scaffold,
};
use ssg_storage::{ContentFile, FsLayoutSource, scan_sources};
use tokio::task::JoinSet;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover ssg.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Counts reported at the end of a build.
#[derive(Debug, Default, PartialEq, Eq)]
struct BuildSummary {
    written: usize,
    failed: usize,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// Every file is attempted; failures are reported one by one and turn into
    /// a single [`CliError::Build`] at the end.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!("Source: {}", config.paths.source_dir.display()));
        output.info(&format!("Output: {}", config.paths.output_dir.display()));

        let summary = build_site(&config, output).await?;
        let total = summary.written + summary.failed;
        if summary.failed > 0 {
            return Err(CliError::Build {
                failed: summary.failed,
                total,
            });
        }

        output.success(&format!(
            "Built {total} files to {}",
            config.paths.output_dir.display()
        ));
        Ok(())
    }
}

async fn build_site(config: &Config, output: &Output) -> Result<BuildSummary, CliError> {
    let source_dir = &config.paths.source_dir;
    let mut summary = BuildSummary::default();

    let root = source_dir.clone();
    let paths = tokio::task::spawn_blocking(move || scan_sources(&root))
        .await
        .map_err(|e| CliError::Io(std::io::Error::other(e)))??;

    let mut files = Vec::new();
    for path in paths {
        match ContentFile::load(source_dir, &path).await {
            Ok(file) => files.push(file),
            Err(err) => {
                output.error(&format!("{}: {err}", path.display()));
                summary.failed += 1;
            }
        }
    }

    let registry = Arc::new(ssg_renderer::defaults());
    let index_patterns = config
        .index_regexes()?
        .into_iter()
        .map(IndexPattern::Regex)
        .collect();
    let options = ScaffoldOptions::default()
        .with_pages(config.pages_regex()?)
        .with_navigation(
            NavOptions::default()
                .with_index_patterns(index_patterns)
                .with_name_resolver(registry.name_resolver()),
        );
    let site = scaffold(&mut files, &options);
    if site.page_count() == 0 {
        output.warning("No pages matched; navigation is empty");
    }
    tracing::info!(files = files.len(), pages = site.page_count(), "Scaffolded site");

    // One lookup source per run so layout caches never outlive the build.
    let layouts = Arc::new(FsLayoutSource::new(config.paths.layouts_dir.clone()));
    let partials = Arc::new(FsLayoutSource::new(config.paths.partials_dir.clone()));
    let helper = PartialHelper::new(partials, Arc::clone(&registry));
    let renderer = Arc::new(
        ChainRenderer::new(registry, layouts)
            .with_extensions(Extensions::new().with_helper("partial", Arc::new(helper))),
    );

    let mut tasks = JoinSet::new();
    for (index, file) in files.into_iter().enumerate() {
        let renderer = Arc::clone(&renderer);
        let navigation = site.view(index);
        let output_dir = config.paths.output_dir.clone();
        tasks.spawn(async move {
            let source = file.relative_path.clone();
            let result = render_and_write(&renderer, file, navigation, &output_dir).await;
            (source, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((source, Ok(target))) => {
                tracing::info!(source = %source, target = %target.display(), "Wrote file");
                summary.written += 1;
            }
            Ok((source, Err(err))) => {
                output.error(&format!("{source}: {err}"));
                summary.failed += 1;
            }
            Err(err) => {
                output.error(&format!("Render task failed: {err}"));
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

async fn render_and_write(
    renderer: &ChainRenderer,
    mut file: ContentFile,
    navigation: Option<Arc<Navigation>>,
    output_dir: &Path,
) -> Result<PathBuf, CliError> {
    let contents = renderer.render(&mut file, navigation).await?;
    let target = output_dir.join(&file.relative_path);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, contents).await?;
    Ok(target)
}
