use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;

#[derive(Parser, Debug)]
#[command(name = "scenecomp", version)]
struct Cli {
    /// Engine configuration JSON. Built-in tables are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline steps to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decoded scene as JSON.
    Decode(CodeArgs),
    /// Print the cache key for a scene code.
    Key(CodeArgs),
    /// Fetch assets and print the render plan as JSON.
    Plan(PlanArgs),
    /// Render a scene to PNG and print the response metadata as JSON.
    Render(RenderArgs),
    /// List every character code and the asset it names.
    Codes,
}

#[derive(Parser, Debug)]
struct CodeArgs {
    /// Scene code, e.g. `a1.b4.c7.h.c`.
    code: String,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    code: String,

    /// Asset root containing `characters/` and `backgrounds/`.
    #[arg(long)]
    assets: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    code: String,

    /// Asset root containing `characters/` and `backgrounds/`.
    #[arg(long)]
    assets: PathBuf,

    /// Cache root; renders land in `generated/`. No caching when omitted.
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Decode(args) => {
            let d = scenecomp::SceneDescriptor::decode(&args.code, &config.codes);
            print_json(&d)
        }
        Command::Key(args) => {
            let d = scenecomp::SceneDescriptor::decode(&args.code, &config.codes);
            println!("{}", scenecomp::derive_key(&d, &config));
            Ok(())
        }
        Command::Plan(args) => cmd_plan(config, args),
        Command::Render(args) => cmd_render(config, args),
        Command::Codes => {
            let list = config
                .codes
                .combinations()
                .into_iter()
                .map(|(code, asset)| serde_json::json!({ "code": code, "asset": asset }))
                .collect::<Vec<_>>();
            print_json(&list)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<scenecomp::EngineConfig> {
    match path {
        Some(p) => scenecomp::EngineConfig::from_path(p)
            .with_context(|| format!("load engine config '{}'", p.display())),
        None => Ok(scenecomp::EngineConfig::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value).context("serialize output JSON")?;
    println!("{s}");
    Ok(())
}

fn cmd_plan(config: scenecomp::EngineConfig, args: PlanArgs) -> anyhow::Result<()> {
    let engine = scenecomp::SceneEngine::new(
        config,
        Arc::new(scenecomp::FsAssetStore::new(&args.assets)),
        Arc::new(scenecomp::NoopCacheStore),
    )?;
    let (_, plan) = engine.plan(&args.code);
    print_json(&plan)
}

fn cmd_render(config: scenecomp::EngineConfig, args: RenderArgs) -> anyhow::Result<()> {
    let cache: Arc<dyn scenecomp::CacheStore> = match &args.cache {
        Some(root) => Arc::new(scenecomp::FsCacheStore::new(root)),
        None => Arc::new(scenecomp::NoopCacheStore),
    };
    let engine = scenecomp::SceneEngine::new(
        config,
        Arc::new(scenecomp::FsAssetStore::new(&args.assets)),
        cache,
    )?;
    let resp = engine.render(&args.code)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &resp.bytes)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    let mut meta = serde_json::to_value(&resp).context("serialize response metadata")?;
    if let Some(obj) = meta.as_object_mut() {
        obj.insert("sha256".to_string(), sha256_hex(&resp.bytes).into());
        obj.insert("bytes".to_string(), resp.bytes.len().into());
    }
    print_json(&meta)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
