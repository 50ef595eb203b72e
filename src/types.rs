use crate::parser::parse_mpls;
use crate::MplsError;
use serde::Serialize;
use std::{
    fmt::{Debug, Display},
    fs::File,
    io::Read,
    path::Path,
};

/// The movie playlist.
///
/// See the [crate-level docs] for high-level documentation about how to use this type.
///
/// [crate-level docs]: ../index.html
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mpls {
    /// The version code from the file header, e.g. `200` for `"0200"`.
    pub version: u16,
    pub addresses: SectionAddresses,
    pub app_info_play_list: AppInfoPlayList,
    pub play_list: PlayList,
    pub marks: PlayListMark,
    /// `None` when the file carries no extension data.
    pub extension_data: Option<ExtensionData>,
}

/// Absolute file offsets of the top-level sections, as stored in the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SectionAddresses {
    pub play_list: u32,
    pub play_list_mark: u32,
    /// Zero when there is no extension data.
    pub extension_data: u32,
}

/// Represents a playlist's angle.
///
/// "Angles", as they are called, are just a variation of a playlist where one
/// or more segments are swapped out for different ones. The overall number of
/// segments, however, is always the same for all angles.
///
/// You can use the [`segments`] method to retrieve the playlist segments
/// associated with this angle.
///
/// [`segments`]: #method.segments
#[derive(Copy, Clone, Debug)]
pub struct Angle<'mpls> {
    /// The angle index in this playlist.
    pub index: u8,
    mpls: &'mpls Mpls,
}

impl Display for Angle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl Mpls {
    /// Parses a movie playlist from an in-memory buffer.
    ///
    /// # Examples
    /// ```
    /// use bluray_mpls::{Mpls, MplsError};
    ///
    /// let err = Mpls::parse(b"XPLS0200").unwrap_err();
    /// assert!(matches!(err, MplsError::InvalidSignature(_)));
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Mpls, MplsError> {
        parse_mpls(bytes)
    }

    /// Attempts to parse a movie playlist from the given reader.
    ///
    /// # Examples
    /// ```no_run
    /// # fn main() -> std::io::Result<()> {
    /// use std::fs::File;
    /// use bluray_mpls::Mpls;
    ///
    /// let file = File::open("00800.mpls")?;
    /// let mpls = Mpls::from(&file).expect("failed to parse MPLS file.");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from<R: Read>(mut reader: R) -> Result<Mpls, MplsError> {
        let bytes = {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer)?;
            buffer
        };

        parse_mpls(&bytes)
    }

    /// Opens the file at `path` and parses it as a movie playlist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Mpls, MplsError> {
        let file = File::open(path)?;
        Mpls::from(file)
    }

    /// Gets all of the movie's angles.
    ///
    /// This method will return at least one element whenever the playlist has
    /// a play item, since it counts the main feature as an angle regardless of
    /// whether the movie contains any additional angles.
    pub fn angles(&self) -> Vec<Angle<'_>> {
        self.play_list
            .play_items
            .iter()
            .map(|p| p.angle_clips().len() + 1)
            .max()
            .map(|n| {
                (0..n)
                    .map(|i| Angle {
                        index: i as u8,
                        mpls: self,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<'mpls> Angle<'mpls> {
    /// Gets all segments for this angle, one per play item.
    ///
    /// Play items without a clip for this angle contribute their main clip.
    pub fn segments(&self) -> Vec<&'mpls Clip> {
        self.mpls
            .play_list
            .play_items
            .iter()
            .map(|p| p.clip_for_angle(self))
            .collect()
    }
}

/// Global playback policy of the playlist.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct AppInfoPlayList {
    pub playback_type: PlaybackType,
    /// Always zero for [`PlaybackType::Standard`].
    pub playback_count: u16,
    pub uo_mask: UoMaskTable,
    pub random_access: bool,
    pub audio_mix: bool,
    pub lossless_bypass: bool,
    pub mvc_base_view_r: bool,
    pub sdr_conversion_notification: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PlaybackType {
    Standard,
    Random,
    Shuffle,
    Unknown(u8),
}

impl From<u8> for PlaybackType {
    fn from(n: u8) -> Self {
        match n {
            0x1 => PlaybackType::Standard,
            0x2 => PlaybackType::Random,
            0x3 => PlaybackType::Shuffle,
            n => PlaybackType::Unknown(n),
        }
    }
}

/// User operation mask.
///
/// Each flag that is set prohibits the corresponding user operation while
/// the playlist (or play item) is playing.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct UoMaskTable {
    pub menu_call: bool,
    pub title_search: bool,
    pub chapter_search: bool,
    pub time_search: bool,
    pub skip_to_next_point: bool,
    pub skip_to_prev_point: bool,
    pub stop: bool,
    pub pause_on: bool,
    pub still_off: bool,
    pub forward_play: bool,
    pub backward_play: bool,
    pub resume: bool,
    pub move_up_selected_button: bool,
    pub move_down_selected_button: bool,
    pub move_left_selected_button: bool,
    pub move_right_selected_button: bool,
    pub select_button: bool,
    pub activate_button: bool,
    pub select_and_activate_button: bool,
    pub primary_audio_stream_number_change: bool,
    pub angle_number_change: bool,
    pub popup_on: bool,
    pub popup_off: bool,
    pub primary_pg_enable_disable: bool,
    pub primary_pg_stream_number_change: bool,
    pub secondary_video_enable_disable: bool,
    pub secondary_video_stream_number_change: bool,
    pub secondary_audio_enable_disable: bool,
    pub secondary_audio_stream_number_change: bool,
    pub secondary_pg_stream_number_change: bool,
}

impl UoMaskTable {
    /// Decodes the mask from its first five bytes, most significant bit first.
    pub fn from_bytes(b: [u8; 5]) -> Self {
        let bit = |byte: usize, pos: u8| (b[byte] >> pos) & 0x1 == 1;
        UoMaskTable {
            menu_call: bit(0, 7),
            title_search: bit(0, 6),
            chapter_search: bit(0, 5),
            time_search: bit(0, 4),
            skip_to_next_point: bit(0, 3),
            skip_to_prev_point: bit(0, 2),
            stop: bit(0, 0),
            pause_on: bit(1, 7),
            still_off: bit(1, 5),
            forward_play: bit(1, 4),
            backward_play: bit(1, 3),
            resume: bit(1, 2),
            move_up_selected_button: bit(1, 1),
            move_down_selected_button: bit(1, 0),
            move_left_selected_button: bit(2, 7),
            move_right_selected_button: bit(2, 6),
            select_button: bit(2, 5),
            activate_button: bit(2, 4),
            select_and_activate_button: bit(2, 3),
            primary_audio_stream_number_change: bit(2, 2),
            angle_number_change: bit(2, 0),
            popup_on: bit(3, 7),
            popup_off: bit(3, 6),
            primary_pg_enable_disable: bit(3, 5),
            primary_pg_stream_number_change: bit(3, 4),
            secondary_video_enable_disable: bit(3, 3),
            secondary_video_stream_number_change: bit(3, 2),
            secondary_audio_enable_disable: bit(3, 1),
            secondary_audio_stream_number_change: bit(3, 0),
            secondary_pg_stream_number_change: bit(4, 6),
        }
    }

    /// All flags with their names, in wire order.
    pub fn flags(&self) -> [(&'static str, bool); 30] {
        [
            ("menu_call", self.menu_call),
            ("title_search", self.title_search),
            ("chapter_search", self.chapter_search),
            ("time_search", self.time_search),
            ("skip_to_next_point", self.skip_to_next_point),
            ("skip_to_prev_point", self.skip_to_prev_point),
            ("stop", self.stop),
            ("pause_on", self.pause_on),
            ("still_off", self.still_off),
            ("forward_play", self.forward_play),
            ("backward_play", self.backward_play),
            ("resume", self.resume),
            ("move_up_selected_button", self.move_up_selected_button),
            ("move_down_selected_button", self.move_down_selected_button),
            ("move_left_selected_button", self.move_left_selected_button),
            ("move_right_selected_button", self.move_right_selected_button),
            ("select_button", self.select_button),
            ("activate_button", self.activate_button),
            ("select_and_activate_button", self.select_and_activate_button),
            (
                "primary_audio_stream_number_change",
                self.primary_audio_stream_number_change,
            ),
            ("angle_number_change", self.angle_number_change),
            ("popup_on", self.popup_on),
            ("popup_off", self.popup_off),
            ("primary_pg_enable_disable", self.primary_pg_enable_disable),
            (
                "primary_pg_stream_number_change",
                self.primary_pg_stream_number_change,
            ),
            (
                "secondary_video_enable_disable",
                self.secondary_video_enable_disable,
            ),
            (
                "secondary_video_stream_number_change",
                self.secondary_video_stream_number_change,
            ),
            (
                "secondary_audio_enable_disable",
                self.secondary_audio_enable_disable,
            ),
            (
                "secondary_audio_stream_number_change",
                self.secondary_audio_stream_number_change,
            ),
            (
                "secondary_pg_stream_number_change",
                self.secondary_pg_stream_number_change,
            ),
        ]
    }

    /// Names of the prohibited operations.
    pub fn prohibited(&self) -> Vec<&'static str> {
        self.flags()
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayList {
    pub play_items: Vec<PlayItem>,
    pub sub_paths: Vec<SubPath>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayItem {
    pub clip: Clip,
    pub connection_condition: u8,
    pub in_time: TimeStamp,
    pub out_time: TimeStamp,
    pub uo_mask: UoMaskTable,
    pub random_access: bool,
    pub still: Still,
    /// Present only for multi-angle play items.
    pub multi_angle: Option<MultiAngle>,
    pub stream_number_table: StreamNumberTable,
}

impl PlayItem {
    pub fn is_multi_angle(&self) -> bool {
        self.multi_angle.is_some()
    }

    /// The clips of angles 1 and up; angle 0 is [`clip`](#structfield.clip).
    pub fn angle_clips(&self) -> &[Clip] {
        match &self.multi_angle {
            Some(m) => &m.clips,
            None => &[],
        }
    }

    pub fn clip_for_angle(&self, angle: &Angle) -> &Clip {
        match angle.index {
            0 => &self.clip,
            i => self
                .angle_clips()
                .get(i as usize - 1)
                .unwrap_or(&self.clip),
        }
    }
}

/// The angle table of a multi-angle play item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiAngle {
    pub is_different_audios: bool,
    pub is_seamless_angle_change: bool,
    /// Additional angles; the play item's own clip is not repeated here.
    pub clips: Vec<Clip>,
}

/// Still behaviour at the end of a play item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Still {
    None,
    /// Hold the last picture for the given number of seconds.
    Finite(u16),
    Infinite,
    Unknown(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubPlayItem {
    pub clip: Clip,
    pub connection_condition: u8,
    pub in_time: TimeStamp,
    pub out_time: TimeStamp,
    pub sync_play_item_id: u16,
    pub sync_start_pts: TimeStamp,
    /// Present only when the sub play item carries multiple clip entries.
    pub multi_clip_entries: Option<Vec<Clip>>,
}

impl SubPlayItem {
    pub fn is_multi_clip(&self) -> bool {
        self.multi_clip_entries.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionData {
    pub data_block_start: u32,
    pub entries: Vec<ExtensionDataEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionDataEntry {
    pub data_type: u16,
    pub data_version: u16,
    /// Start of the payload, relative to the start of the extension data section.
    pub start_address: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubPath {
    pub sub_path_type: SubPathType,
    pub is_repeat: bool,
    pub sub_play_items: Vec<SubPlayItem>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SubPathType {
    PrimaryAudioSlideshow,
    InteractiveGraphicsMenu,
    TextSubtitle,
    OutOfMuxSynchronous,
    OutOfMuxAsynchronousPip,
    InMuxSynchronousPip,
    StereoscopicVideo,
    StereoscopicInteractiveGraphicsMenu,
    DolbyVisionEnhancementLayer,
    Unknown(u8),
}

impl From<u8> for SubPathType {
    fn from(n: u8) -> Self {
        match n {
            0x2 => SubPathType::PrimaryAudioSlideshow,
            0x3 => SubPathType::InteractiveGraphicsMenu,
            0x4 => SubPathType::TextSubtitle,
            0x5 => SubPathType::OutOfMuxSynchronous,
            0x6 => SubPathType::OutOfMuxAsynchronousPip,
            0x7 => SubPathType::InMuxSynchronousPip,
            0x8 => SubPathType::StereoscopicVideo,
            0x9 => SubPathType::StereoscopicInteractiveGraphicsMenu,
            0xA => SubPathType::DolbyVisionEnhancementLayer,
            n => SubPathType::Unknown(n),
        }
    }
}

/// A clip file, also known as a segment.
///
/// This identifies the playable stream file. `file_name` consists of 5 numbers
/// (e.g. "00055"), and `codec_id` of 4 letters which will usually be "M2TS" on
/// blu-rays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clip {
    pub file_name: String,
    pub codec_id: String,
    pub stc_id: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayListMark {
    pub marks: Vec<Mark>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Mark {
    pub mark_type: MarkType,
    pub play_item: PlayItemRef,
    pub time_stamp: TimeStamp,
    pub entry_es_pid: u16,
    pub duration: TimeStamp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MarkType {
    EntryPoint,
    LinkPoint,
    Unknown(u8),
}

impl From<u8> for MarkType {
    fn from(n: u8) -> Self {
        match n {
            0x1 => MarkType::EntryPoint,
            0x2 => MarkType::LinkPoint,
            n => MarkType::Unknown(n),
        }
    }
}

/// Stream lists of a play item, in the order they are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamNumberTable {
    pub primary_video_streams: Vec<Stream>,
    pub primary_audio_streams: Vec<Stream>,
    pub primary_pgs_streams: Vec<Stream>,
    pub secondary_pgs_streams: Vec<Stream>,
    pub primary_igs_streams: Vec<Stream>,
    pub secondary_audio_streams: Vec<Stream>,
    pub secondary_video_streams: Vec<Stream>,
    pub dolby_vision_streams: Vec<Stream>,
}

/// A media stream within a [`Clip`].
///
/// [`Clip`]: struct.Clip.html
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    pub entry: StreamEntry,
    pub attrs: StreamAttributes,
}

/// Where a stream lives, keyed by the entry's stream type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum StreamEntry {
    /// Type 1: a stream of the play item's own clip.
    PlayItem { pid: StreamRef },
    /// Type 2: a stream of a sub clip of a sub path.
    SubPathClip {
        sub_path: SubPathRef,
        sub_clip: SubClipRef,
        pid: StreamRef,
    },
    /// Types 3 and 4: a stream of a sub path.
    SubPath {
        stream_type: u8,
        sub_path: SubPathRef,
        pid: StreamRef,
    },
    /// Any other stream type; carries no references.
    Unknown { stream_type: u8 },
}

impl StreamEntry {
    pub fn stream_type(&self) -> u8 {
        match self {
            StreamEntry::PlayItem { .. } => 0x1,
            StreamEntry::SubPathClip { .. } => 0x2,
            StreamEntry::SubPath { stream_type, .. } | StreamEntry::Unknown { stream_type } => {
                *stream_type
            }
        }
    }

    /// The referenced PID, or zero when the entry carries none.
    pub fn pid(&self) -> u16 {
        match self {
            StreamEntry::PlayItem { pid }
            | StreamEntry::SubPathClip { pid, .. }
            | StreamEntry::SubPath { pid, .. } => pid.0,
            StreamEntry::Unknown { .. } => 0,
        }
    }

    /// The referenced sub path id, or zero when the entry carries none.
    pub fn sub_path_id(&self) -> u8 {
        match self {
            StreamEntry::SubPathClip { sub_path, .. } | StreamEntry::SubPath { sub_path, .. } => {
                sub_path.0
            }
            _ => 0,
        }
    }

    /// The referenced sub clip id, or zero when the entry carries none.
    pub fn sub_clip_id(&self) -> u8 {
        match self {
            StreamEntry::SubPathClip { sub_clip, .. } => sub_clip.0,
            _ => 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SubPathRef(pub u8);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SubClipRef(pub u8);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PlayItemRef(pub u16);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRef(pub u16);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamAttributes {
    pub coding_type: StreamCodingType,
    pub format: StreamFormat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum StreamCodingType {
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4AvcVideo,
    Mpeg4MvcVideo,
    Vc1Video,
    HevcVideo,
    Mpeg1Audio,
    Mpeg2Audio,
    Lpcm,
    DolbyDigital,
    Dts,
    DolbyTrueHd,
    DolbyDigitalPlus,
    DtsHdHighResolution,
    DtsHdMaster,
    DolbyDigitalPlusSecondary,
    DtsHdSecondary,
    PresentationGraphics,
    InteractiveGraphics,
    TextSubtitle,
    /// Decoded with the audio field layout.
    Unknown(u8),
}

impl From<u8> for StreamCodingType {
    fn from(n: u8) -> Self {
        use StreamCodingType::*;
        match n {
            0x01 => Mpeg1Video,
            0x02 => Mpeg2Video,
            0x1B => Mpeg4AvcVideo,
            0x20 => Mpeg4MvcVideo,
            0xEA => Vc1Video,
            0x24 => HevcVideo,
            0x03 => Mpeg1Audio,
            0x04 => Mpeg2Audio,
            0x80 => Lpcm,
            0x81 => DolbyDigital,
            0x82 => Dts,
            0x83 => DolbyTrueHd,
            0x84 => DolbyDigitalPlus,
            0x85 => DtsHdHighResolution,
            0x86 => DtsHdMaster,
            0xA1 => DolbyDigitalPlusSecondary,
            0xA2 => DtsHdSecondary,
            0x90 => PresentationGraphics,
            0x91 => InteractiveGraphics,
            0x92 => TextSubtitle,
            n => Unknown(n),
        }
    }
}

/// Coding-type specific stream attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StreamFormat {
    Video(VideoFormat, FrameRate),
    HdrVideo {
        format: VideoFormat,
        frame_rate: FrameRate,
        dynamic_range: DynamicRange,
        color_space: ColorSpace,
        cr_flag: bool,
        hdr_plus_flag: bool,
    },
    Audio(AudioFormat, SampleRate, LanguageCode),
    Graphics(LanguageCode),
    Text(LanguageCode, CharacterCode),
}

impl StreamFormat {
    pub fn language(&self) -> Option<&str> {
        match self {
            StreamFormat::Audio(_, _, l) | StreamFormat::Graphics(l) | StreamFormat::Text(l, _) => {
                Some(l.as_str())
            }
            _ => None,
        }
    }
}

pub type LanguageCode = String;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum CharacterCode {
    Utf8,
    Utf16BE,
    ShiftJIS,
    EucKr,
    Gb18030,
    EucCn,
    Big5,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AudioFormat {
    Mono,
    Stereo,
    Multichannel,
    StereoAndMultichannel,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SampleRate {
    One(u32),
    Two(u32, u32),
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum VideoFormat {
    Interlaced480,
    Interlaced576,
    Interlaced1080,
    Progressive480,
    Progressive576,
    Progressive720,
    Progressive1080,
    Progressive2160,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum DynamicRange {
    Sdr,
    Hdr10,
    DolbyVision,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ColorSpace {
    BT709,
    BT2020,
    Unknown,
}

pub type FrameRate = Option<FrameRateFraction>;

/// A video frame rate, represented as a fraction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct FrameRateFraction {
    pub numerator: i32,
    pub denominator: i32,
}

impl FrameRateFraction {
    /// Returns the fraction's value as an `f64`.
    pub fn fps(&self) -> f64 {
        (self.numerator as f64) / (self.denominator as f64)
    }
}

/// A time stamp, relative to some System Time Clock sequence, expressed in 45 KHz.
///
/// To get a floating-point value in seconds, you can use the [`seconds`] method.
///
/// [`seconds`]: #method.seconds
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeStamp(pub u32);

impl TimeStamp {
    /// Ticks per second of the playlist clock.
    pub const CLOCK: u32 = 45_000;

    /// Returns this time stamp in units of seconds.
    ///
    /// ```
    /// # use bluray_mpls::TimeStamp;
    /// assert_eq!(TimeStamp(450_000).seconds(), 10.0);
    /// ```
    pub fn seconds(&self) -> f64 {
        (self.0 as f64) / f64::from(TimeStamp::CLOCK)
    }
}

impl Debug for TimeStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStamp")
            .field("raw", &self.0)
            .field("secs", &self.seconds())
            .finish()
    }
}
