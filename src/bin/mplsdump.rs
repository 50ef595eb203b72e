use std::path::PathBuf;

use anyhow::{Context, Result};
use bluray_mpls::{ExtensionData, Mpls, PlayItem, StreamFormat, StreamNumberTable, SubPath};
use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "mplsdump",
    version = env!("CARGO_PKG_VERSION"),
    about = "Print the contents of a Blu-ray movie playlist (MPLS) file",
    long_about = None,
)]
struct Cli {
    /// MPLS file path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Print the decoded playlist as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Set the log level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    loglevel: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors (default).
    Warn,
    /// Show info, warnings and errors.
    Info,
    /// Show section-level decoding details.
    Debug,
    /// Show every decoded record.
    Trace,
}

impl LogLevel {
    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.loglevel.to_level_filter())
        .format_timestamp(None)
        .try_init()?;

    log::info!("Reading playlist: {}", cli.input.display());
    let mpls = Mpls::open(&cli.input)
        .with_context(|| format!("failed to decode {}", cli.input.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&mpls)?);
    } else {
        print_summary(&mpls);
    }

    Ok(())
}

fn print_summary(mpls: &Mpls) {
    let app_info = &mpls.app_info_play_list;
    println!("Version:         {:04}", mpls.version);
    println!("Playback type:   {:?}", app_info.playback_type);
    if app_info.playback_count != 0 {
        println!("Playback count:  {}", app_info.playback_count);
    }
    let prohibited = app_info.uo_mask.prohibited();
    if !prohibited.is_empty() {
        println!("Prohibited ops:  {}", prohibited.join(", "));
    }
    println!("Angles:          {}", mpls.angles().len());

    println!();
    println!("Play items ({}):", mpls.play_list.play_items.len());
    for (i, item) in mpls.play_list.play_items.iter().enumerate() {
        print_play_item(i, item);
    }

    if !mpls.play_list.sub_paths.is_empty() {
        println!();
        println!("Sub paths ({}):", mpls.play_list.sub_paths.len());
        for (i, sub_path) in mpls.play_list.sub_paths.iter().enumerate() {
            print_sub_path(i, sub_path);
        }
    }

    println!();
    println!("Marks ({}):", mpls.marks.marks.len());
    for (i, mark) in mpls.marks.marks.iter().enumerate() {
        println!(
            "  {:3}  {:?}  item {}  {}",
            i,
            mark.mark_type,
            mark.play_item.0,
            time_str(mark.time_stamp.seconds())
        );
    }

    if let Some(ext) = &mpls.extension_data {
        println!();
        print_extension_data(ext);
    }
}

fn print_play_item(index: usize, item: &PlayItem) {
    println!(
        "  {:3}  {}.{}  {} - {}",
        index,
        item.clip.file_name,
        item.clip.codec_id,
        time_str(item.in_time.seconds()),
        time_str(item.out_time.seconds())
    );
    for (i, clip) in item.angle_clips().iter().enumerate() {
        println!("         angle {}: {}.{}", i + 1, clip.file_name, clip.codec_id);
    }
    print_streams(&item.stream_number_table);
}

fn print_streams(table: &StreamNumberTable) {
    let lists = [
        ("video", &table.primary_video_streams),
        ("audio", &table.primary_audio_streams),
        ("pg", &table.primary_pgs_streams),
        ("secondary pg", &table.secondary_pgs_streams),
        ("ig", &table.primary_igs_streams),
        ("secondary audio", &table.secondary_audio_streams),
        ("secondary video", &table.secondary_video_streams),
        ("dolby vision", &table.dolby_vision_streams),
    ];
    for (kind, streams) in lists.iter() {
        for stream in streams.iter() {
            let detail = match &stream.attrs.format {
                StreamFormat::Video(format, _) => format!("{:?}", format),
                StreamFormat::HdrVideo {
                    format,
                    dynamic_range,
                    ..
                } => format!("{:?} {:?}", format, dynamic_range),
                other => other.language().unwrap_or_default().to_string(),
            };
            println!(
                "         {:<15}  pid {:#06x}  {:?}  {}",
                kind,
                stream.entry.pid(),
                stream.attrs.coding_type,
                detail
            );
        }
    }
}

fn print_sub_path(index: usize, sub_path: &SubPath) {
    println!(
        "  {:3}  {:?}{}",
        index,
        sub_path.sub_path_type,
        if sub_path.is_repeat { " (repeat)" } else { "" }
    );
    for item in sub_path.sub_play_items.iter() {
        println!(
            "         {}.{}  {} - {}  sync item {}",
            item.clip.file_name,
            item.clip.codec_id,
            time_str(item.in_time.seconds()),
            time_str(item.out_time.seconds()),
            item.sync_play_item_id
        );
    }
}

fn print_extension_data(ext: &ExtensionData) {
    println!("Extension data ({} entries):", ext.entries.len());
    for entry in ext.entries.iter() {
        println!(
            "  type {:#06x}  version {}  {} bytes",
            entry.data_type,
            entry.data_version,
            entry.data.len()
        );
    }
}

fn time_str(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as u64;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        millis / 3_600_000,
        (millis / 60_000) % 60,
        (millis / 1000) % 60,
        millis % 1000
    )
}
