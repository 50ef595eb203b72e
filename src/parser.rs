use super::types;
use crate::MplsError;
use log::{debug, trace};
use nom::{
    bytes::complete::take,
    combinator::{cond, map},
    do_parse,
    error::ErrorKind,
    map,
    multi::count,
    number::complete::{be_u16, be_u32, be_u8},
    sequence::tuple,
    Err, IResult, Offset,
};
use std::ops::Range;
use types::{
    AppInfoPlayList, AudioFormat, CharacterCode, Clip, ColorSpace, DynamicRange, ExtensionData,
    ExtensionDataEntry, FrameRate, FrameRateFraction, LanguageCode, Mark, MarkType, Mpls,
    MultiAngle, PlayItem, PlayItemRef, PlayList, PlayListMark, PlaybackType, SampleRate,
    SectionAddresses, Still, Stream, StreamAttributes, StreamCodingType, StreamEntry, StreamFormat,
    StreamNumberTable, StreamRef, SubClipRef, SubPath, SubPathRef, SubPathType, SubPlayItem,
    TimeStamp, UoMaskTable, VideoFormat,
};

/// The application info section sits at a fixed position, not behind a header address.
const APP_INFO: Range<usize> = 0x28..0x39;

/// Runs `body` over one self-length-prefixed record and advances past it.
///
/// Declared lengths never include the prefix, so a record spans the prefix
/// width plus the declared length. Bytes the body leaves unread are skipped.
/// Every variable-length record goes through here; no caller computes a
/// record span on its own.
fn framed<'a, O, L, F>(length: L, body: F) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], O>
where
    L: Fn(&'a [u8]) -> IResult<&'a [u8], usize>,
    F: Fn(&'a [u8]) -> IResult<&'a [u8], O>,
{
    move |input: &'a [u8]| {
        let (input, len) = length(input)?;
        let (rest, record) = take(len)(input)?;
        let (_, value) = body(record)?;
        Ok((rest, value))
    }
}

fn len8(input: &[u8]) -> IResult<&[u8], usize> {
    map(be_u8, usize::from)(input)
}

fn len16(input: &[u8]) -> IResult<&[u8], usize> {
    map(be_u16, usize::from)(input)
}

fn len32(input: &[u8]) -> IResult<&[u8], usize> {
    map(be_u32, |n| n as usize)(input)
}

fn text(len: usize, input: &[u8]) -> IResult<&[u8], String> {
    map(take(len), |v: &[u8]| String::from_utf8_lossy(v).into_owned())(input)
}

fn code(input: &[u8]) -> IResult<&[u8], [u8; 4]> {
    map(take(4usize), |b: &[u8]| [b[0], b[1], b[2], b[3]])(input)
}

fn addr(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

fn clip_file_name(input: &[u8]) -> IResult<&[u8], String> {
    text(5, input)
}

fn clip_codec_id(input: &[u8]) -> IResult<&[u8], String> {
    text(4, input)
}

fn language_code(input: &[u8]) -> IResult<&[u8], LanguageCode> {
    text(3, input)
}

fn time_stamp(input: &[u8]) -> IResult<&[u8], TimeStamp> {
    map(be_u32, TimeStamp)(input)
}

// the field is 64 bits wide, flags are only defined in the first 5 bytes
fn uo_mask_table(input: &[u8]) -> IResult<&[u8], UoMaskTable> {
    map(take(8usize), |b: &[u8]| {
        UoMaskTable::from_bytes([b[0], b[1], b[2], b[3], b[4]])
    })(input)
}

fn clip_with_stc_id(input: &[u8]) -> IResult<&[u8], Clip> {
    map(
        tuple((clip_file_name, clip_codec_id, be_u8)),
        |(file_name, codec_id, stc_id)| Clip {
            file_name,
            codec_id,
            stc_id,
        },
    )(input)
}

fn stream_entry(input: &[u8]) -> IResult<&[u8], StreamEntry> {
    fn stream_pid(input: &[u8]) -> IResult<&[u8], StreamRef> {
        map(be_u16, StreamRef)(input)
    }

    fn sub_clip_id(input: &[u8]) -> IResult<&[u8], SubClipRef> {
        map(be_u8, SubClipRef)(input)
    }

    fn sub_path_id(input: &[u8]) -> IResult<&[u8], SubPathRef> {
        map(be_u8, SubPathRef)(input)
    }

    fn parser(input: &[u8]) -> IResult<&[u8], StreamEntry> {
        let (input, stream_type) = be_u8(input)?;
        match stream_type {
            0x1 => map(stream_pid, |pid| StreamEntry::PlayItem { pid })(input),
            0x2 => map(
                tuple((sub_path_id, sub_clip_id, stream_pid)),
                |(sub_path, sub_clip, pid)| StreamEntry::SubPathClip {
                    sub_path,
                    sub_clip,
                    pid,
                },
            )(input),
            0x3 | 0x4 => map(tuple((sub_path_id, stream_pid)), move |(sub_path, pid)| {
                StreamEntry::SubPath {
                    stream_type,
                    sub_path,
                    pid,
                }
            })(input),
            _ => Ok((input, StreamEntry::Unknown { stream_type })),
        }
    }

    framed(len8, parser)(input)
}

fn stream_attrs(input: &[u8]) -> IResult<&[u8], StreamAttributes> {
    fn video_format(input: &[u8]) -> IResult<&[u8], (VideoFormat, FrameRate)> {
        map(be_u8, |n| {
            let video_format = match (n & 0xF0) >> 4 {
                0x1 => VideoFormat::Interlaced480,
                0x2 => VideoFormat::Interlaced576,
                0x3 => VideoFormat::Progressive480,
                0x4 => VideoFormat::Interlaced1080,
                0x5 => VideoFormat::Progressive720,
                0x6 => VideoFormat::Progressive1080,
                0x7 => VideoFormat::Progressive576,
                0x8 => VideoFormat::Progressive2160,
                _ => VideoFormat::Unknown,
            };
            let fraction = |numerator, denominator| {
                Some(FrameRateFraction {
                    numerator,
                    denominator,
                })
            };
            let frame_rate = match n & 0x0F {
                0x1 => fraction(24_000, 1_001),
                0x2 => fraction(24, 1),
                0x3 => fraction(25, 1),
                0x4 => fraction(30_000, 1_001),
                0x6 => fraction(50, 1),
                0x7 => fraction(60_000, 1_001),
                _ => None,
            };
            (video_format, frame_rate)
        })(input)
    }
    fn dyn_range_col_space(input: &[u8]) -> IResult<&[u8], (DynamicRange, ColorSpace)> {
        map(be_u8, |n| {
            let dyn_range = match (n & 0xF0) >> 4 {
                0x0 => DynamicRange::Sdr,
                0x1 => DynamicRange::Hdr10,
                0x2 => DynamicRange::DolbyVision,
                _ => DynamicRange::Unknown,
            };
            let color_space = match n & 0x0F {
                0x1 => ColorSpace::BT709,
                0x2 => ColorSpace::BT2020,
                _ => ColorSpace::Unknown,
            };
            (dyn_range, color_space)
        })(input)
    }
    // (cr_flag, hdr_plus_flag)
    fn hdr_flags(input: &[u8]) -> IResult<&[u8], (bool, bool)> {
        map(be_u8, |n| ((n & 0x80) != 0, (n & 0x40) != 0))(input)
    }
    fn audio_format(input: &[u8]) -> IResult<&[u8], (AudioFormat, SampleRate)> {
        map(be_u8, |n| {
            let audio_format = match (n & 0xF0) >> 4 {
                0x1 => AudioFormat::Mono,
                0x3 => AudioFormat::Stereo,
                0x6 => AudioFormat::Multichannel,
                0xC => AudioFormat::StereoAndMultichannel,
                _ => AudioFormat::Unknown,
            };
            let sample_rate = match n & 0x0F {
                0x1 => SampleRate::One(48_000),
                0x4 => SampleRate::One(96_000),
                0x5 => SampleRate::One(192_000),
                0xC => SampleRate::Two(48_000, 192_000),
                0xE => SampleRate::Two(48_000, 96_000),
                _ => SampleRate::Unknown,
            };
            (audio_format, sample_rate)
        })(input)
    }
    fn char_code(input: &[u8]) -> IResult<&[u8], CharacterCode> {
        map(be_u8, |n| match n {
            0x1 => CharacterCode::Utf8,
            0x2 => CharacterCode::Utf16BE,
            0x3 => CharacterCode::ShiftJIS,
            0x4 => CharacterCode::EucKr,
            0x5 => CharacterCode::Gb18030,
            0x6 => CharacterCode::EucCn,
            0x7 => CharacterCode::Big5,
            _ => CharacterCode::Unknown,
        })(input)
    }

    fn parser(input: &[u8]) -> IResult<&[u8], StreamAttributes> {
        let (input, coding_type) = be_u8(input)?;
        let (input, format) = match coding_type {
            0x01 | 0x02 | 0x1B | 0x20 | 0xEA => {
                map(video_format, |(v, f)| StreamFormat::Video(v, f))(input)
            }
            0x24 => map(
                tuple((video_format, dyn_range_col_space, hdr_flags)),
                |((format, frame_rate), (dynamic_range, color_space), (cr_flag, hdr_plus_flag))| {
                    StreamFormat::HdrVideo {
                        format,
                        frame_rate,
                        dynamic_range,
                        color_space,
                        cr_flag,
                        hdr_plus_flag,
                    }
                },
            )(input),
            // graphics (PGS/IGS)
            0x90 | 0x91 => map(language_code, StreamFormat::Graphics)(input),
            0x92 => map(tuple((char_code, language_code)), |(c, l)| {
                StreamFormat::Text(l, c)
            })(input),
            // audio, and the layout for any coding type not listed above
            _ => map(tuple((audio_format, language_code)), |((a, s), l)| {
                StreamFormat::Audio(a, s, l)
            })(input),
        }?;

        let coding_type = StreamCodingType::from(coding_type);
        if let StreamCodingType::Unknown(n) = coding_type {
            debug!("unknown stream coding type {:#04x}, read as audio", n);
        }

        Ok((
            input,
            StreamAttributes {
                coding_type,
                format,
            },
        ))
    }

    framed(len8, parser)(input)
}

fn stream(input: &[u8]) -> IResult<&[u8], Stream> {
    let (input, (entry, attrs)) = tuple((stream_entry, stream_attrs))(input)?;
    trace!("stream {:?} {:?}", entry, attrs.coding_type);
    Ok((input, Stream { entry, attrs }))
}

fn stream_number_table(input: &[u8]) -> IResult<&[u8], StreamNumberTable> {
    fn parser(input: &[u8]) -> IResult<&[u8], StreamNumberTable> {
        let (input, (_, p_video, p_audio, p_pgs, p_igs, s_audio, s_video, s_pgs, dv, _)) =
            tuple((
                take(2usize),
                be_u8,
                be_u8,
                be_u8,
                be_u8,
                be_u8,
                be_u8,
                be_u8,
                be_u8,
                take(4usize),
            ))(input)?;

        // the lists are stored in a different order than their counts
        let (input, primary_video_streams) = count(stream, p_video as usize)(input)?;
        let (input, primary_audio_streams) = count(stream, p_audio as usize)(input)?;
        let (input, primary_pgs_streams) = count(stream, p_pgs as usize)(input)?;
        let (input, secondary_pgs_streams) = count(stream, s_pgs as usize)(input)?;
        let (input, primary_igs_streams) = count(stream, p_igs as usize)(input)?;
        let (input, secondary_audio_streams) = count(stream, s_audio as usize)(input)?;
        let (input, secondary_video_streams) = count(stream, s_video as usize)(input)?;
        let (input, dolby_vision_streams) = count(stream, dv as usize)(input)?;

        Ok((
            input,
            StreamNumberTable {
                primary_video_streams,
                primary_audio_streams,
                primary_pgs_streams,
                secondary_pgs_streams,
                primary_igs_streams,
                secondary_audio_streams,
                secondary_video_streams,
                dolby_vision_streams,
            },
        ))
    }

    framed(len16, parser)(input)
}

fn sub_play_item(input: &[u8]) -> IResult<&[u8], SubPlayItem> {
    // the sub play item's own clip is entry 0 and is not repeated in the list
    fn multi_clip_entries(input: &[u8]) -> IResult<&[u8], Vec<Clip>> {
        let (input, additional) = map(be_u8, |n| n.saturating_sub(1))(input)?;
        let (input, _) = take(1usize)(input)?;
        count(clip_with_stc_id, additional as usize)(input)
    }

    fn parser(input: &[u8]) -> IResult<&[u8], SubPlayItem> {
        let (input, (file_name, codec_id, _, flags, stc_id)) =
            tuple((clip_file_name, clip_codec_id, take(3usize), be_u8, be_u8))(input)?;
        let connection_condition = (flags >> 1) & 0x0F;
        let is_multi_clip = (flags & 0x1) == 1;

        let (input, (in_time, out_time, sync_play_item_id, sync_start_pts)) =
            tuple((time_stamp, time_stamp, be_u16, time_stamp))(input)?;
        let (input, multi_clip_entries) = cond(is_multi_clip, multi_clip_entries)(input)?;

        Ok((
            input,
            SubPlayItem {
                clip: Clip {
                    file_name,
                    codec_id,
                    stc_id,
                },
                connection_condition,
                in_time,
                out_time,
                sync_play_item_id,
                sync_start_pts,
                multi_clip_entries,
            },
        ))
    }

    framed(len16, parser)(input)
}

fn sub_path(input: &[u8]) -> IResult<&[u8], SubPath> {
    fn parser(input: &[u8]) -> IResult<&[u8], SubPath> {
        let (input, (_, sub_path_type, _, flags, _, num_items)) = tuple((
            take(1usize),
            map(be_u8, SubPathType::from),
            take(1usize),
            be_u8,
            take(1usize),
            be_u8,
        ))(input)?;
        let (input, sub_play_items) = count(sub_play_item, num_items as usize)(input)?;
        trace!(
            "sub path {:?} with {} sub play items",
            sub_path_type,
            sub_play_items.len()
        );

        Ok((
            input,
            SubPath {
                sub_path_type,
                is_repeat: (flags & 0x1) == 1,
                sub_play_items,
            },
        ))
    }

    framed(len32, parser)(input)
}

fn play_item_angles(input: &[u8]) -> IResult<&[u8], MultiAngle> {
    // main clip counts as an angle, too, so we want to read (n - 1) angle clips
    let (input, additional_angles) = map(be_u8, |n| n.saturating_sub(1))(input)?;
    let (input, (is_different_audios, is_seamless_angle_change)) =
        map(be_u8, |b| ((b & 0x2) != 0, (b & 0x1) != 0))(input)?;
    let (input, clips) = count(clip_with_stc_id, additional_angles as usize)(input)?;

    Ok((
        input,
        MultiAngle {
            is_different_audios,
            is_seamless_angle_change,
            clips,
        },
    ))
}

fn still(input: &[u8]) -> IResult<&[u8], Still> {
    map(tuple((be_u8, be_u16)), |(mode, time)| match mode {
        0x0 => Still::None,
        0x1 => Still::Finite(time),
        0x2 => Still::Infinite,
        n => Still::Unknown(n),
    })(input)
}

fn play_item(input: &[u8]) -> IResult<&[u8], PlayItem> {
    fn parser(input: &[u8]) -> IResult<&[u8], PlayItem> {
        let (input, (file_name, codec_id, _, flags, stc_id)) =
            tuple((clip_file_name, clip_codec_id, take(1usize), be_u8, be_u8))(input)?;
        // ...X CCCC: is_multi_angle, connection_condition
        let is_multi_angle = (flags & 0x10) != 0;
        let connection_condition = flags & 0x0F;

        let (input, (in_time, out_time, uo_mask, random_access, still)) = tuple((
            time_stamp,
            time_stamp,
            uo_mask_table,
            map(be_u8, |b| (b & 0x80) != 0),
            still,
        ))(input)?;
        let (input, multi_angle) = cond(is_multi_angle, play_item_angles)(input)?;
        let (input, stream_number_table) = stream_number_table(input)?;
        trace!(
            "play item {}.{} {:.3}s..{:.3}s",
            file_name,
            codec_id,
            in_time.seconds(),
            out_time.seconds()
        );

        Ok((
            input,
            PlayItem {
                clip: Clip {
                    file_name,
                    codec_id,
                    stc_id,
                },
                connection_condition,
                in_time,
                out_time,
                uo_mask,
                random_access,
                still,
                multi_angle,
                stream_number_table,
            },
        ))
    }

    framed(len16, parser)(input)
}

fn play_list(input: &[u8]) -> IResult<&[u8], PlayList> {
    fn parser(input: &[u8]) -> IResult<&[u8], PlayList> {
        let (input, (_, n_play_items, n_sub_paths)) =
            tuple((take(2usize), be_u16, be_u16))(input)?;
        let (input, play_items) = count(play_item, n_play_items as usize)(input)?;
        let (input, sub_paths) = count(sub_path, n_sub_paths as usize)(input)?;

        Ok((
            input,
            PlayList {
                play_items,
                sub_paths,
            },
        ))
    }

    framed(len32, parser)(input)
}

// The section view is cut to a fixed size, shorter than its declared length,
// so the length field is read but not used to frame it.
fn app_info_play_list(input: &[u8]) -> IResult<&[u8], AppInfoPlayList> {
    let (input, (_, _, playback_type, raw_playback_count, uo_mask, flags)) = tuple((
        be_u32,
        take(1usize),
        map(be_u8, PlaybackType::from),
        be_u16,
        uo_mask_table,
        be_u8,
    ))(input)?;

    let playback_count = match playback_type {
        PlaybackType::Standard => 0,
        _ => raw_playback_count,
    };

    Ok((
        input,
        AppInfoPlayList {
            playback_type,
            playback_count,
            uo_mask,
            random_access: (flags & 0x80) != 0,
            audio_mix: (flags & 0x40) != 0,
            lossless_bypass: (flags & 0x20) != 0,
            mvc_base_view_r: (flags & 0x10) != 0,
            sdr_conversion_notification: (flags & 0x08) != 0,
        },
    ))
}

fn play_list_mark(input: &[u8]) -> IResult<&[u8], PlayListMark> {
    fn mark(input: &[u8]) -> IResult<&[u8], Mark> {
        do_parse!(
            input,
            be_u8
                >> mark_type: map!(be_u8, |n| MarkType::from(n))
                >> play_item: map!(be_u16, |n| PlayItemRef(n))
                >> ts: time_stamp
                >> entry_es_pid: be_u16
                >> duration: time_stamp
                >> (Mark {
                    mark_type,
                    play_item,
                    time_stamp: ts,
                    entry_es_pid,
                    duration
                })
        )
    }
    fn parser(input: &[u8]) -> IResult<&[u8], PlayListMark> {
        let (input, n_marks) = be_u16(input)?;
        map(count(mark, n_marks as usize), |marks| PlayListMark { marks })(input)
    }

    framed(len32, parser)(input)
}

struct ExtEntryHeader {
    data_type: u16,
    data_version: u16,
    start_address: u32,
    data_len: u32,
}

/// Decodes the extension data directory.
///
/// `section` starts at the length field and runs to the end of the file;
/// entry addresses are relative to its start and may point anywhere in it.
fn extension_data(section: &[u8]) -> IResult<&[u8], Option<ExtensionData>> {
    fn ext_data_entry(input: &[u8]) -> IResult<&[u8], ExtEntryHeader> {
        do_parse!(
            input,
            data_type: be_u16
                >> data_version: be_u16
                >> start_address: be_u32
                >> data_len: be_u32
                >> (ExtEntryHeader {
                    data_type,
                    data_version,
                    start_address,
                    data_len
                })
        )
    }

    let (input, len) = be_u32(section)?;
    if len == 0 {
        return Ok((input, None));
    }
    let (input, (data_block_start, _, num_entries)) =
        tuple((be_u32, take(3usize), be_u8))(input)?;
    let (input, headers) = count(ext_data_entry, num_entries as usize)(input)?;

    let mut entries = Vec::with_capacity(headers.len());
    for header in headers {
        let (at, _) = take(header.start_address as usize)(section)?;
        let (_, data) = take(header.data_len as usize)(at)?;
        trace!(
            "extension data entry {:#06x} v{}: {} bytes",
            header.data_type,
            header.data_version,
            data.len()
        );
        entries.push(ExtensionDataEntry {
            data_type: header.data_type,
            data_version: header.data_version,
            start_address: header.start_address,
            data: Vec::from(data),
        });
    }

    Ok((
        input,
        Some(ExtensionData {
            data_block_start,
            entries,
        }),
    ))
}

fn section_addresses(input: &[u8]) -> IResult<&[u8], SectionAddresses> {
    map(
        tuple((addr, addr, addr)),
        |(play_list, play_list_mark, extension_data)| SectionAddresses {
            play_list,
            play_list_mark,
            extension_data,
        },
    )(input)
}

/// Maps a decoder failure to the absolute offset in `whole` where it happened.
fn out_of_bounds(whole: &[u8], err: Err<(&[u8], ErrorKind)>) -> MplsError {
    let offset = match err {
        Err::Error((rest, _)) | Err::Failure((rest, _)) => whole.offset(rest),
        Err::Incomplete(_) => whole.len(),
    };
    MplsError::OutOfBounds { offset }
}

fn finish<'a, T>(whole: &'a [u8], res: IResult<&'a [u8], T>) -> Result<T, MplsError> {
    res.map(|(_, value)| value)
        .map_err(|e| out_of_bounds(whole, e))
}

fn section(whole: &[u8], addr: u32) -> Result<&[u8], MplsError> {
    whole
        .get(addr as usize..)
        .ok_or(MplsError::OutOfBounds {
            offset: addr as usize,
        })
}

pub fn parse_mpls(input: &[u8]) -> Result<Mpls, MplsError> {
    let (rest, signature) = code(input).map_err(|e| out_of_bounds(input, e))?;
    if &signature != b"MPLS" {
        return Err(MplsError::InvalidSignature(signature));
    }

    let (rest, version_code) = code(rest).map_err(|e| out_of_bounds(input, e))?;
    let version = std::str::from_utf8(&version_code)
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .ok_or(MplsError::InvalidVersion(version_code))?;

    let addresses = finish(input, section_addresses(rest))?;
    debug!("MPLS version {:04}, sections at {:?}", version, addresses);

    let app_info = input.get(APP_INFO).ok_or(MplsError::OutOfBounds {
        offset: input.len(),
    })?;
    let app_info_play_list = finish(input, app_info_play_list(app_info))?;

    let play_list = finish(input, play_list(section(input, addresses.play_list)?))?;
    debug!(
        "play list: {} play items, {} sub paths",
        play_list.play_items.len(),
        play_list.sub_paths.len()
    );

    let marks = finish(
        input,
        play_list_mark(section(input, addresses.play_list_mark)?),
    )?;
    debug!("play list marks: {}", marks.marks.len());

    let extension_data = match addresses.extension_data {
        0 => None,
        addr => finish(input, extension_data(section(input, addr)?))?,
    };

    Ok(Mpls {
        version,
        addresses,
        app_info_play_list,
        play_list,
        marks,
        extension_data,
    })
}
