//! Builders for synthetic MPLS files.
#![allow(dead_code)]

/// Offset of the application info section.
pub const APP_INFO_START: usize = 0x28;

fn u16_be(n: u16) -> [u8; 2] {
    n.to_be_bytes()
}

fn u32_be(n: u32) -> [u8; 4] {
    n.to_be_bytes()
}

fn with_len8(body: Vec<u8>) -> Vec<u8> {
    let mut out = vec![body.len() as u8];
    out.extend(body);
    out
}

fn with_len16(body: Vec<u8>) -> Vec<u8> {
    let mut out = u16_be(body.len() as u16).to_vec();
    out.extend(body);
    out
}

fn with_len32(body: Vec<u8>) -> Vec<u8> {
    let mut out = u32_be(body.len() as u32).to_vec();
    out.extend(body);
    out
}

fn padded(mut body: Vec<u8>, len: usize) -> Vec<u8> {
    body.resize(len.max(body.len()), 0);
    body
}

/// Stream entry of type 1, padded to the usual 9 bytes.
pub fn entry_play_item(pid: u16) -> Vec<u8> {
    let mut body = vec![0x01];
    body.extend(&u16_be(pid));
    with_len8(padded(body, 9))
}

/// Stream entry of type 2.
pub fn entry_sub_path_clip(sub_path: u8, sub_clip: u8, pid: u16) -> Vec<u8> {
    let mut body = vec![0x02, sub_path, sub_clip];
    body.extend(&u16_be(pid));
    with_len8(padded(body, 9))
}

/// Stream entry of type 3 or 4.
pub fn entry_sub_path(stream_type: u8, sub_path: u8, pid: u16) -> Vec<u8> {
    let mut body = vec![stream_type, sub_path];
    body.extend(&u16_be(pid));
    with_len8(padded(body, 9))
}

/// Stream attributes, padded to the usual 5 bytes.
pub fn attrs(coding_type: u8, fields: &[u8]) -> Vec<u8> {
    let mut body = vec![coding_type];
    body.extend(fields);
    with_len8(padded(body, 5))
}

pub fn stream(entry: Vec<u8>, attrs: Vec<u8>) -> Vec<u8> {
    let mut out = entry;
    out.extend(attrs);
    out
}

/// Stream lists in storage order: primary video, primary audio, primary PG,
/// secondary PG, primary IG, secondary audio, secondary video, Dolby Vision.
#[derive(Default)]
pub struct Streams {
    pub primary_video: Vec<Vec<u8>>,
    pub primary_audio: Vec<Vec<u8>>,
    pub primary_pg: Vec<Vec<u8>>,
    pub secondary_pg: Vec<Vec<u8>>,
    pub primary_ig: Vec<Vec<u8>>,
    pub secondary_audio: Vec<Vec<u8>>,
    pub secondary_video: Vec<Vec<u8>>,
    pub dolby_vision: Vec<Vec<u8>>,
}

pub fn stn(s: &Streams) -> Vec<u8> {
    let mut body = vec![0, 0];
    // counts are stored PV PA PG IG SA SV SPG DV
    for list in [
        &s.primary_video,
        &s.primary_audio,
        &s.primary_pg,
        &s.primary_ig,
        &s.secondary_audio,
        &s.secondary_video,
        &s.secondary_pg,
        &s.dolby_vision,
    ]
    .iter()
    {
        body.push(list.len() as u8);
    }
    body.extend(&[0, 0, 0, 0]);
    for list in [
        &s.primary_video,
        &s.primary_audio,
        &s.primary_pg,
        &s.secondary_pg,
        &s.primary_ig,
        &s.secondary_audio,
        &s.secondary_video,
        &s.dolby_vision,
    ]
    .iter()
    {
        for stream in list.iter() {
            body.extend(stream);
        }
    }
    with_len16(body)
}

fn clip(name: &str, stc_id: u8) -> Vec<u8> {
    let mut out = name.as_bytes().to_vec();
    out.extend(b"M2TS");
    out.push(stc_id);
    out
}

pub struct PlayItemFields<'a> {
    pub name: &'a str,
    pub in_time: u32,
    pub out_time: u32,
    pub connection_condition: u8,
    /// Clip names of angles 1 and up.
    pub angles: Option<Vec<&'a str>>,
    pub uo_mask: [u8; 5],
    pub still_mode: u8,
    pub still_time: u16,
    pub stn: Vec<u8>,
}

impl<'a> PlayItemFields<'a> {
    pub fn new(name: &'a str, in_time: u32, out_time: u32) -> Self {
        PlayItemFields {
            name,
            in_time,
            out_time,
            connection_condition: 1,
            angles: None,
            uo_mask: [0; 5],
            still_mode: 0,
            still_time: 0,
            stn: stn(&Streams::default()),
        }
    }
}

pub fn play_item(fields: &PlayItemFields) -> Vec<u8> {
    let mut body = fields.name.as_bytes().to_vec();
    body.extend(b"M2TS");
    body.push(0);
    let multi_angle = if fields.angles.is_some() { 0x10 } else { 0 };
    body.push(multi_angle | fields.connection_condition);
    body.push(0);
    body.extend(&u32_be(fields.in_time));
    body.extend(&u32_be(fields.out_time));
    body.extend(&fields.uo_mask);
    body.extend(&[0, 0, 0]);
    body.push(0x80);
    body.push(fields.still_mode);
    body.extend(&u16_be(fields.still_time));
    if let Some(angles) = &fields.angles {
        body.push(angles.len() as u8 + 1);
        body.push(0x01);
        for (i, name) in angles.iter().enumerate() {
            body.extend(clip(name, i as u8 + 1));
        }
    }
    body.extend(&fields.stn);
    with_len16(body)
}

pub fn sub_play_item(
    name: &str,
    in_time: u32,
    out_time: u32,
    sync_play_item_id: u16,
    multi_clips: Option<Vec<&str>>,
) -> Vec<u8> {
    let mut body = name.as_bytes().to_vec();
    body.extend(b"M2TS");
    body.extend(&[0, 0, 0]);
    let multi_clip = if multi_clips.is_some() { 0x01 } else { 0 };
    // connection condition 5
    body.push((0x05 << 1) | multi_clip);
    body.push(0);
    body.extend(&u32_be(in_time));
    body.extend(&u32_be(out_time));
    body.extend(&u16_be(sync_play_item_id));
    body.extend(&u32_be(in_time));
    if let Some(clips) = &multi_clips {
        body.push(clips.len() as u8 + 1);
        body.push(0);
        for name in clips.iter() {
            body.extend(clip(name, 0));
        }
    }
    with_len16(body)
}

pub fn sub_path(sub_path_type: u8, is_repeat: bool, items: &[Vec<u8>]) -> Vec<u8> {
    let mut body = vec![0, sub_path_type, 0, is_repeat as u8, 0, items.len() as u8];
    for item in items.iter() {
        body.extend(item);
    }
    with_len32(body)
}

pub fn play_list(items: &[Vec<u8>], sub_paths: &[Vec<u8>]) -> Vec<u8> {
    let mut body = vec![0, 0];
    body.extend(&u16_be(items.len() as u16));
    body.extend(&u16_be(sub_paths.len() as u16));
    for item in items.iter() {
        body.extend(item);
    }
    for path in sub_paths.iter() {
        body.extend(path);
    }
    with_len32(body)
}

/// `(mark type, play item, time stamp, duration)`
pub fn marks(marks: &[(u8, u16, u32, u32)]) -> Vec<u8> {
    let mut body = u16_be(marks.len() as u16).to_vec();
    for (mark_type, item, ts, duration) in marks.iter() {
        body.push(0);
        body.push(*mark_type);
        body.extend(&u16_be(*item));
        body.extend(&u32_be(*ts));
        body.extend(&[0xFF, 0xFF]);
        body.extend(&u32_be(*duration));
    }
    with_len32(body)
}

pub fn app_info(playback_type: u8, playback_count: u16, uo_mask: [u8; 5], flags: u8) -> Vec<u8> {
    let mut body = vec![0, playback_type];
    body.extend(&u16_be(playback_count));
    body.extend(&uo_mask);
    body.extend(&[0, 0, 0]);
    body.push(flags);
    body.push(0);
    with_len32(body)
}

/// `(type, version, payload)`; payloads are laid out after the directory.
pub fn extension_data(entries: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let directory_len = 12 + 12 * entries.len();
    let mut payloads: Vec<u8> = Vec::new();
    let mut body = Vec::new();
    body.extend(&u32_be(directory_len as u32));
    body.extend(&[0, 0, 0, entries.len() as u8]);
    for (data_type, version, data) in entries.iter() {
        body.extend(&u16_be(*data_type));
        body.extend(&u16_be(*version));
        body.extend(&u32_be((directory_len + payloads.len()) as u32));
        body.extend(&u32_be(data.len() as u32));
        payloads.extend(data);
    }
    body.extend(payloads);
    with_len32(body)
}

/// Lays the sections out back to back after the application info.
pub fn mpls(
    version: &[u8; 4],
    app_info: Vec<u8>,
    play_list: Vec<u8>,
    marks: Vec<u8>,
    extension_data: Option<Vec<u8>>,
) -> Vec<u8> {
    let play_list_start = APP_INFO_START + app_info.len();
    let marks_start = play_list_start + play_list.len();
    let ext_start = match &extension_data {
        Some(_) => marks_start + marks.len(),
        None => 0,
    };

    let mut out = b"MPLS".to_vec();
    out.extend(version);
    out.extend(&u32_be(play_list_start as u32));
    out.extend(&u32_be(marks_start as u32));
    out.extend(&u32_be(ext_start as u32));
    out.resize(APP_INFO_START, 0);
    out.extend(app_info);
    out.extend(play_list);
    out.extend(marks);
    if let Some(ext) = extension_data {
        out.extend(ext);
    }
    out
}

/// A file with no play items, sub paths, marks or extension data.
pub fn minimal() -> Vec<u8> {
    mpls(
        b"0200",
        app_info(1, 0, [0; 5], 0),
        play_list(&[], &[]),
        marks(&[]),
        None,
    )
}
