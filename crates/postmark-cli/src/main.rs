//! Postmark command-line interface.
//!
//! Composes postcard images, publishes them to the storage gateway, lists
//! and shares stored memories, and walks the infinite gallery grid.

mod clipboard;

use clap::{Parser, Subcommand, ValueEnum};
use clipboard::ClipboardSink;
use kurbo::{Point, Size, Vec2};
use postmark_core::config::{ConfigError, PostmarkConfig};
use postmark_core::device::DeviceClass;
use postmark_core::item::ItemError;
use postmark_core::layout::UploadTilePlacement;
use postmark_core::memory::{Memory, Visibility};
use postmark_core::share::{self, ShareError, ShareTarget};
use postmark_core::storage::{LastUploadStore, StorageError, open_storage};
use postmark_core::views::{Carousel, GalleryMode, ListWindow};
use postmark_core::wallet::{AddressWallet, WalletError};
use postmark_core::{InfiniteGrid, PointerEvent};
use postmark_net::{
    ExistenceProbe, Gallery, GatewayClient, HttpUploader, NetError, Publisher, UploadRequest,
};
use postmark_render::{
    CompressOptions, Compositor, OutputFormat, PolaroidOptions, RenderError, TextEngine,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Net(#[from] NetError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No wallet address; pass --wallet or set wallet_address in the config")]
    MissingWallet,
    #[error("Memory not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Usage(String),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(name = "postmark", version, about = "Photo postcards on permanent storage")]
struct Cli {
    /// Config file (JSON); defaults to the platform config directory.
    #[arg(long, env = "POSTMARK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Wallet address owning uploads; overrides the config.
    #[arg(long, env = "POSTMARK_WALLET", global = true)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a photo into a framed postcard.
    Compose {
        /// Image file or http(s) URL.
        input: String,
        /// Output file; defaults to `postcard.<ext>`.
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,
        /// JPEG quality between 0 and 1.
        #[arg(long, default_value_t = 0.92)]
        quality: f32,
        #[arg(long, value_enum, default_value_t = DeviceArg::Desktop)]
        device: DeviceArg,
        /// Copy the composite to the clipboard.
        #[arg(long)]
        copy: bool,
        /// Print the composite as a data URL.
        #[arg(long)]
        data_url: bool,
    },
    /// Publish a photo to the storage gateway.
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        private: bool,
        /// Re-encode as JPEG before uploading.
        #[arg(long)]
        compress: bool,
        #[arg(long, default_value_t = 2048)]
        max_dimension: u32,
        /// Wait until the gateway serves the upload.
        #[arg(long)]
        wait: bool,
    },
    /// List stored memories.
    List {
        /// Only memories owned by this address.
        #[arg(long)]
        owner: Option<String>,
        /// Show this id first if the index has not caught up yet.
        #[arg(long)]
        highlight: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Check whether the gateway serves an image for an id.
    Probe { id: String },
    /// Print or copy a share link for a memory.
    Share {
        id: String,
        #[arg(long, value_enum)]
        target: Option<TargetArg>,
        #[arg(long, default_value = "")]
        text: String,
        #[arg(long)]
        copy: bool,
    },
    /// Print the gallery items visible in a viewport.
    Grid {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
        /// Device class; derived from the viewport width when unset.
        #[arg(long, value_enum)]
        device: Option<DeviceArg>,
        /// Number of upload tiles to place.
        #[arg(long, default_value_t = 0)]
        uploads: usize,
        #[arg(long, default_value_t = 1)]
        seed: u32,
        /// Scroll the view by `dx,dy` before listing.
        #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
        pan: Option<Vec2>,
        #[arg(long, value_enum, default_value_t = ModeArg::Grid)]
        mode: ModeArg,
        /// Selected index in carousel mode, scroll offset row in list mode.
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Jpeg => OutputFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceArg {
    Mobile,
    Tablet,
    Desktop,
}

impl From<DeviceArg> for DeviceClass {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Mobile => DeviceClass::Mobile,
            DeviceArg::Tablet => DeviceClass::Tablet,
            DeviceArg::Desktop => DeviceClass::Desktop,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    X,
    Telegram,
    Whatsapp,
}

impl From<TargetArg> for ShareTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::X => ShareTarget::X,
            TargetArg::Telegram => ShareTarget::Telegram,
            TargetArg::Whatsapp => ShareTarget::WhatsApp,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Grid,
    Carousel,
    List,
}

impl From<ModeArg> for GalleryMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Grid => GalleryMode::Grid,
            ModeArg::Carousel => GalleryMode::Carousel,
            ModeArg::List => GalleryMode::List,
        }
    }
}

/// Parse `dx,dy`.
fn parse_pan(value: &str) -> Result<Vec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected dx,dy, got {value:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad dx: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad dy: {e}"))?;
    Ok(Vec2::new(x, y))
}

fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    std::fs::write(path, bytes).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn print_memory(memory: &Memory) {
    let title = memory.title.as_deref().unwrap_or("(untitled)");
    let location = memory.location.as_deref().unwrap_or("");
    println!("{}\t{}\t{}\t{}", memory.id, memory.visibility.as_str(), title, location);
}

struct App {
    config: PostmarkConfig,
    wallet: Option<String>,
}

impl App {
    fn client(&self) -> GatewayClient {
        GatewayClient::new(&self.config.gateway, self.config.app.clone())
    }

    fn wallet(&self) -> CliResult<AddressWallet> {
        let address = self
            .wallet
            .clone()
            .or_else(|| self.config.wallet_address.clone())
            .ok_or(CliError::MissingWallet)?;
        Ok(AddressWallet::connected(address)?)
    }

    fn last_upload(&self) -> CliResult<LastUploadStore<postmark_core::storage::FileStorage>> {
        let storage = open_storage(self.config.storage_dir.clone())?;
        Ok(LastUploadStore::new(Arc::new(storage)))
    }

    async fn run(&self, command: Command) -> CliResult<()> {
        match command {
            Command::Compose {
                input,
                out,
                title,
                location,
                handle,
                date,
                format,
                quality,
                device,
                copy,
                data_url,
            } => {
                let bytes = if is_remote(&input) {
                    self.client().fetch_bytes(&input).await?
                } else {
                    read_file(Path::new(&input))?
                };
                let opts = PolaroidOptions {
                    title,
                    location,
                    handle,
                    date,
                    format: format.into(),
                    quality,
                    device: device.into(),
                    ..PolaroidOptions::default()
                };
                let text = TextEngine::load(
                    self.config.font_path.as_deref(),
                    self.config.font_bold_path.as_deref(),
                )?;
                let mut compositor = Compositor::new(text);
                let rendered = compositor.render_bytes(&bytes, &opts)?;

                let out = out.unwrap_or_else(|| {
                    PathBuf::from(format!("postcard.{}", rendered.format.extension()))
                });
                write_file(&out, &rendered.bytes)?;
                println!("{} ({}x{})", out.display(), rendered.width, rendered.height);

                if data_url {
                    println!("{}", rendered.data_url());
                }
                if copy {
                    let mut sink = ClipboardSink::new()?;
                    share::copy_composite(&mut sink, &rendered.clipboard_image())?;
                }
                Ok(())
            }
            Command::Upload {
                file,
                title,
                location,
                handle,
                private,
                compress,
                max_dimension,
                wait,
            } => {
                let wallet = self.wallet()?;
                let uploader = HttpUploader::from_config(&self.config.gateway)?;
                let publisher =
                    Publisher::new(uploader, self.last_upload()?, self.config.app.clone());
                let request = UploadRequest {
                    data: read_file(&file)?,
                    title,
                    location,
                    handle,
                    visibility: if private {
                        Visibility::Private
                    } else {
                        Visibility::Public
                    },
                    compress: compress.then(|| CompressOptions {
                        max_dimension,
                        ..CompressOptions::default()
                    }),
                };
                let memory = publisher.publish(&wallet, request).await?;
                let client = self.client();
                println!("{}", client.memory_url(&memory.id));

                if wait {
                    let probe = ExistenceProbe::from_config(&self.config.probe);
                    if probe.wait_until_available(&client, &memory.id).await {
                        println!("available");
                    } else {
                        println!("not available yet; it may take a few minutes");
                    }
                }
                Ok(())
            }
            Command::List {
                owner,
                highlight,
                json,
            } => {
                let mut gallery = Gallery::new(self.client(), self.last_upload()?);
                let memories = gallery.refresh(owner.as_deref(), highlight.as_deref()).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(memories)?);
                } else {
                    memories.iter().for_each(print_memory);
                }
                Ok(())
            }
            Command::Probe { id } => {
                let available = self.client().probe(&id).await?;
                println!("{}", if available { "available" } else { "missing" });
                Ok(())
            }
            Command::Share {
                id,
                target,
                text,
                copy,
            } => {
                let client = self.client();
                let memory = client
                    .fetch_memory(&id)
                    .await?
                    .ok_or_else(|| CliError::NotFound(id.clone()))?;
                let url = share::memory_link(client.origin(), &memory.id);
                let link = match target {
                    Some(target) => share::share_link(target.into(), &text, &url)?,
                    None => url.clone(),
                };
                println!("{}", link);
                if copy {
                    let mut sink = ClipboardSink::new()?;
                    share::copy_link(&mut sink, &link)?;
                }
                Ok(())
            }
            Command::Grid {
                owner,
                width,
                height,
                device,
                uploads,
                seed,
                pan,
                mode,
                index,
            } => {
                if width <= 0.0 || height <= 0.0 {
                    return Err(CliError::Usage("viewport must have a positive size".to_string()));
                }
                let mut gallery = Gallery::new(self.client(), self.last_upload()?);
                gallery.refresh(owner.as_deref(), None).await?;
                let count = gallery.memories().len();

                match GalleryMode::from(mode) {
                    GalleryMode::Grid => {
                        let device = device
                            .map(DeviceClass::from)
                            .unwrap_or_else(|| DeviceClass::from_viewport_width(width));
                        let placement = if uploads == 0 {
                            UploadTilePlacement::None
                        } else {
                            UploadTilePlacement::Random { count: uploads, seed }
                        };
                        let items = gallery.grid_items(device, &placement)?;

                        let mut grid = InfiniteGrid::new(self.config.grid.clone());
                        grid.set_device(device);
                        grid.set_viewport(Size::new(width, height));
                        grid.set_items(items);
                        if let Some(delta) = pan {
                            grid.handle_pointer(PointerEvent::Scroll {
                                position: Point::new(width / 2.0, height / 2.0),
                                delta,
                            });
                        }
                        for visible in grid.visible_items() {
                            let Some(item) = grid.item_for(&visible) else {
                                continue;
                            };
                            let b = visible.bounds;
                            println!(
                                "{}\t{:.0},{:.0}\t{:.0}x{:.0}\t{}",
                                visible.key,
                                b.x0,
                                b.y0,
                                b.width(),
                                b.height(),
                                item.image_url
                            );
                        }
                    }
                    GalleryMode::Carousel => {
                        let mut carousel = Carousel::new(count);
                        if count > 0 && !carousel.select(index) {
                            return Err(CliError::Usage(format!("index {} out of range", index)));
                        }
                        for i in carousel.window(2) {
                            let marker = if carousel.current() == Some(i) { "*" } else { " " };
                            print!("{} ", marker);
                            print_memory(&gallery.memories()[i]);
                        }
                    }
                    GalleryMode::List => {
                        let list = ListWindow::default();
                        let range = list.visible_range(count, list.offset_for(index), height);
                        for memory in &gallery.memories()[range] {
                            print_memory(memory);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match PostmarkConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let app = App {
        config,
        wallet: cli.wallet,
    };

    match app.run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
