//! campus-docs – command-line document generator.
//!
//! Usage:
//!   campus-docs offer-letter <request.json> [--config cfg.json] [--out-dir dir] [--font font.ttf]
//!   campus-docs snapshot <kind> <record.json> [--out-dir dir] [--font font.ttf]
//!
//! `offer-letter` composes, protects and stores an offer letter and prints
//! its public URL. `snapshot` captures an ID card, salary slip, certificate
//! or fee receipt and writes it under its download filename.
//!
//! Set `RUST_LOG=debug` for pipeline details.

use std::{env, fs, path::Path, path::PathBuf, process};

use campus_docs::cards::{Certificate, FeeReceipt, IdCard, SalarySlip};
use campus_docs::config::{AppConfig, StorageConfig};
use campus_docs::fonts::FontManager;
use campus_docs::snapshot::{
    BitmapRasterizer, DocumentKind, SnapshotComposer, SnapshotView, DOWNLOAD_FAILED,
};
use campus_docs::{DocumentService, OfferLetterRequest};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("campus-docs");

    let mut positional: Vec<String> = Vec::new();
    let mut config_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut font_path: Option<PathBuf> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => config_path = Some(flag_value(program, arg, iter.next())),
            "--out-dir" | "-o" => out_dir = Some(flag_value(program, arg, iter.next())),
            "--font" | "-f" => font_path = Some(flag_value(program, arg, iter.next())),
            "--help" | "-h" => {
                print_usage(program);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(program);
                process::exit(1);
            }
            value => positional.push(value.to_string()),
        }
    }

    match positional.first().map(String::as_str) {
        Some("offer-letter") => match positional.get(1) {
            Some(request) if positional.len() == 2 => {
                offer_letter(
                    Path::new(request),
                    config_path.as_deref(),
                    out_dir,
                    font_path.as_deref(),
                )
            }
            _ => usage_error(program, "offer-letter takes exactly one request file"),
        },
        Some("snapshot") => match (positional.get(1), positional.get(2)) {
            (Some(kind), Some(record)) if positional.len() == 3 => snapshot(
                kind,
                Path::new(record),
                out_dir.unwrap_or_else(|| PathBuf::from(".")),
                font_path.as_deref(),
            ),
            _ => usage_error(program, "snapshot takes a kind and one record file"),
        },
        Some(other) => usage_error(program, &format!("unknown command '{other}'")),
        None => usage_error(program, "no command specified"),
    }
}

fn offer_letter(
    request_path: &Path,
    config_path: Option<&Path>,
    out_dir: Option<PathBuf>,
    font_path: Option<&Path>,
) {
    let mut config = match config_path {
        Some(path) => AppConfig::from_json_file(path).unwrap_or_else(|e| {
            fail(&format!("Error loading config '{}': {e}", path.display()))
        }),
        None => {
            let mut config = AppConfig::default();
            config.security = config.security.with_env_override();
            config
        }
    };
    if let Some(root) = out_dir {
        let public_base_url = format!("file://{}", root.display());
        config.storage = StorageConfig::Local {
            root,
            public_base_url,
        };
    }

    let raw = read_file(request_path);
    let request: OfferLetterRequest = serde_json::from_str(&raw).unwrap_or_else(|e| {
        fail(&format!("Error parsing '{}': {e}", request_path.display()))
    });

    let service = DocumentService::new(config)
        .unwrap_or_else(|e| fail(&format!("Error configuring document service: {e}")))
        .with_fonts(measuring_fonts(font_path));

    match service.offer_letter(&request) {
        Some(url) => println!("{url}"),
        None => eprintln!(
            "Offer letter for {} could not be generated or stored; \
             the record can be saved without a document.",
            request.record_id
        ),
    }
}

fn snapshot(kind: &str, record_path: &Path, out_dir: PathBuf, font_path: Option<&Path>) {
    let kind: DocumentKind = kind.parse().unwrap_or_else(|e| fail(&format!("Error: {e}")));
    let raw = read_file(record_path);
    let view: Box<dyn SnapshotView> = match parse_view(kind, &raw) {
        Ok(view) => view,
        Err(e) => fail(&format!("Error parsing '{}': {e}", record_path.display())),
    };

    let mut rasterizer = BitmapRasterizer::new();
    if let Some(path) = font_path {
        let bytes = fs::read(path)
            .unwrap_or_else(|e| fail(&format!("Error reading font '{}': {e}", path.display())));
        rasterizer = rasterizer
            .with_font(bytes)
            .unwrap_or_else(|e| fail(&format!("Error loading font '{}': {e}", path.display())));
    }

    if !rasterizer.has_font() {
        log::info!("no --font given; text will be greeked");
    }
    let composer = SnapshotComposer::with_rasterizer(rasterizer);
    let artifact = match composer.capture(view.as_ref()) {
        Ok(artifact) => artifact,
        Err(e) => {
            log::error!("capture failed: {e}");
            fail(DOWNLOAD_FAILED);
        }
    };

    match artifact.save_to(&out_dir) {
        Ok(path) => eprintln!(
            "Wrote '{}' ({} bytes, {:.0}x{:.0} pt)",
            path.display(),
            artifact.bytes.len(),
            artifact.page_size_pt.0,
            artifact.page_size_pt.1
        ),
        Err(e) => fail(&format!("Error writing to '{}': {e}", out_dir.display())),
    }
}

/// Metrics for offer-letter alignment: the given TTF, else builtin Helvetica.
fn measuring_fonts(font_path: Option<&Path>) -> FontManager {
    let mut fonts = FontManager::new();
    match font_path {
        Some(path) => {
            let bytes = fs::read(path)
                .unwrap_or_else(|e| fail(&format!("Error reading font '{}': {e}", path.display())));
            let family = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Body".to_string());
            fonts
                .load_font(&family, false, bytes)
                .unwrap_or_else(|e| fail(&format!("Error loading font '{}': {e}", path.display())));
        }
        None => match FontManager::helvetica() {
            Ok(helvetica) => fonts = helvetica,
            Err(e) => log::warn!("builtin Helvetica metrics unavailable, estimating widths: {e}"),
        },
    }
    fonts
}

fn parse_view(kind: DocumentKind, raw: &str) -> serde_json::Result<Box<dyn SnapshotView>> {
    let view: Box<dyn SnapshotView> = match kind {
        DocumentKind::IdCard => Box::new(serde_json::from_str::<IdCard>(raw)?),
        DocumentKind::SalarySlip => Box::new(serde_json::from_str::<SalarySlip>(raw)?),
        DocumentKind::Certificate => Box::new(serde_json::from_str::<Certificate>(raw)?),
        DocumentKind::FeeReceipt => Box::new(serde_json::from_str::<FeeReceipt>(raw)?),
    };
    Ok(view)
}

fn flag_value(program: &str, flag: &str, value: Option<&String>) -> PathBuf {
    match value {
        Some(v) => PathBuf::from(v),
        None => usage_error(program, &format!("{flag} needs a value")),
    }
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| fail(&format!("Error reading '{}': {e}", path.display())))
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn usage_error(program: &str, message: &str) -> ! {
    eprintln!("Error: {message}.");
    print_usage(program);
    process::exit(1);
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  \
         {program} offer-letter <request.json> [--config cfg.json] [--out-dir dir] [--font font.ttf]\n  \
         {program} snapshot <kind> <record.json> [--out-dir dir] [--font font.ttf]\n\n\
         Kinds: id-card, salary-slip, certificate, fee-receipt\n\n\
         Options:\n  \
         -c, --config   Application config (profile, composer, security, storage)\n  \
         -o, --out-dir  Local storage root / snapshot output directory\n  \
         -f, --font     TrueType font (offer-letter: text metrics, snapshot: glyphs)\n  \
         -h, --help     Show this message\n\n\
         Environment:\n  \
         CAMPUS_DOCS_OWNER_PASSWORD  Owner password for PDF protection\n  \
         RUST_LOG                    Log level (e.g. info, debug)"
    );
}
