//! X11 connection setup protocol
//!
//! This module handles the initial connection handshake between client and server:
//! the fixed packet the client opens with and the record the server answers with.

use super::wire::{WireError, WireReader, WireWriter};
use super::*;

/// Byte order marker for little-endian clients ('l')
pub const BYTE_ORDER_LSB_FIRST: u8 = 0x6c;

/// Connection setup request from client
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub authorization_protocol_name: String,
    pub authorization_protocol_data: Vec<u8>,
}

impl Default for SetupRequest {
    fn default() -> Self {
        SetupRequest {
            protocol_major_version: PROTOCOL_MAJOR_VERSION,
            protocol_minor_version: PROTOCOL_MINOR_VERSION,
            authorization_protocol_name: String::new(),
            authorization_protocol_data: Vec::new(),
        }
    }
}

impl SetupRequest {
    /// Encode the setup packet, always little-endian
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.card8(BYTE_ORDER_LSB_FIRST)
            .padding(1)
            .card16(self.protocol_major_version)
            .card16(self.protocol_minor_version)
            .card16(self.authorization_protocol_name.len() as u16)
            .card16(self.authorization_protocol_data.len() as u16)
            .padding(2)
            .string8(&self.authorization_protocol_name)
            .align()
            .bytes(&self.authorization_protocol_data)
            .align();
        let (data, _) = w.into_parts();
        data
    }
}

/// Setup response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Failed = 0,
    Success = 1,
    Authenticate = 2,
}

impl SetupStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SetupStatus::Failed),
            1 => Some(SetupStatus::Success),
            2 => Some(SetupStatus::Authenticate),
            _ => None,
        }
    }
}

/// Pixmap format information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixmapFormat {
    pub depth: u8,
    pub bits_per_pixel: u8,
    pub scanline_pad: u8,
}

impl PixmapFormat {
    fn decode(r: &mut WireReader) -> Result<Self, WireError> {
        let format = PixmapFormat {
            depth: r.card8()?,
            bits_per_pixel: r.card8()?,
            scanline_pad: r.card8()?,
        };
        r.padding(5)?;
        Ok(format)
    }

    #[cfg(test)]
    fn encode(&self, w: &mut WireWriter) {
        w.card8(self.depth)
            .card8(self.bits_per_pixel)
            .card8(self.scanline_pad)
            .padding(5);
    }
}

/// Visual type information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualType {
    pub visual_id: VisualID,
    pub class: u8,
    pub bits_per_rgb_value: u8,
    pub colormap_entries: u16,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
}

impl VisualType {
    fn decode(r: &mut WireReader) -> Result<Self, WireError> {
        let visual = VisualType {
            visual_id: VisualID(r.card32()?),
            class: r.card8()?,
            bits_per_rgb_value: r.card8()?,
            colormap_entries: r.card16()?,
            red_mask: r.card32()?,
            green_mask: r.card32()?,
            blue_mask: r.card32()?,
        };
        r.padding(4)?;
        Ok(visual)
    }

    #[cfg(test)]
    fn encode(&self, w: &mut WireWriter) {
        w.card32(self.visual_id.get())
            .card8(self.class)
            .card8(self.bits_per_rgb_value)
            .card16(self.colormap_entries)
            .card32(self.red_mask)
            .card32(self.green_mask)
            .card32(self.blue_mask)
            .padding(4);
    }
}

/// Depth information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depth {
    pub depth: u8,
    pub visuals: Vec<VisualType>,
}

impl Depth {
    fn decode(r: &mut WireReader) -> Result<Self, WireError> {
        let depth = r.card8()?;
        r.padding(1)?;
        let visuals_length = r.card16()? as usize;
        r.padding(4)?;
        let visuals = (0..visuals_length)
            .map(|_| VisualType::decode(r))
            .collect::<Result<_, _>>()?;
        Ok(Depth { depth, visuals })
    }

    #[cfg(test)]
    fn encode(&self, w: &mut WireWriter) {
        w.card8(self.depth)
            .padding(1)
            .card16(self.visuals.len() as u16)
            .padding(4);
        for visual in &self.visuals {
            visual.encode(w);
        }
    }
}

/// Screen information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub root: Window,
    pub default_colormap: Colormap,
    pub white_pixel: u32,
    pub black_pixel: u32,
    pub current_input_masks: u32,
    pub width_in_pixels: u16,
    pub height_in_pixels: u16,
    pub width_in_millimeters: u16,
    pub height_in_millimeters: u16,
    pub min_installed_maps: u16,
    pub max_installed_maps: u16,
    pub root_visual: VisualID,
    pub backing_stores: u8,
    pub save_unders: bool,
    pub root_depth: u8,
    pub allowed_depths: Vec<Depth>,
}

impl Screen {
    fn decode(r: &mut WireReader) -> Result<Self, WireError> {
        let root = Window::new(r.card32()?);
        let default_colormap = Colormap::new(r.card32()?);
        let white_pixel = r.card32()?;
        let black_pixel = r.card32()?;
        let current_input_masks = r.card32()?;
        let width_in_pixels = r.card16()?;
        let height_in_pixels = r.card16()?;
        let width_in_millimeters = r.card16()?;
        let height_in_millimeters = r.card16()?;
        let min_installed_maps = r.card16()?;
        let max_installed_maps = r.card16()?;
        let root_visual = VisualID(r.card32()?);
        let backing_stores = r.card8()?;
        let save_unders = r.bool()?;
        let root_depth = r.card8()?;
        let depths_length = r.card8()? as usize;
        let allowed_depths = (0..depths_length)
            .map(|_| Depth::decode(r))
            .collect::<Result<_, _>>()?;
        Ok(Screen {
            root,
            default_colormap,
            white_pixel,
            black_pixel,
            current_input_masks,
            width_in_pixels,
            height_in_pixels,
            width_in_millimeters,
            height_in_millimeters,
            min_installed_maps,
            max_installed_maps,
            root_visual,
            backing_stores,
            save_unders,
            root_depth,
            allowed_depths,
        })
    }

    #[cfg(test)]
    fn encode(&self, w: &mut WireWriter) {
        w.card32(self.root.id().get())
            .card32(self.default_colormap.id().get())
            .card32(self.white_pixel)
            .card32(self.black_pixel)
            .card32(self.current_input_masks)
            .card16(self.width_in_pixels)
            .card16(self.height_in_pixels)
            .card16(self.width_in_millimeters)
            .card16(self.height_in_millimeters)
            .card16(self.min_installed_maps)
            .card16(self.max_installed_maps)
            .card32(self.root_visual.get())
            .card8(self.backing_stores)
            .bool(self.save_unders)
            .card8(self.root_depth)
            .card8(self.allowed_depths.len() as u8);
        for depth in &self.allowed_depths {
            depth.encode(w);
        }
    }

    /// Look up a visual by ID among this screen's depths
    pub fn find_visual(&self, visual_id: VisualID) -> Option<(u8, &VisualType)> {
        self.allowed_depths.iter().find_map(|depth| {
            depth
                .visuals
                .iter()
                .find(|visual| visual.visual_id == visual_id)
                .map(|visual| (depth.depth, visual))
        })
    }
}

/// Everything the server told us on a successful connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInfo {
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub release_number: u32,
    pub resource_id_base: u32,
    pub resource_id_mask: u32,
    pub motion_buffer_size: u32,
    /// In 4-byte units; raised once BIG-REQUESTS is enabled
    pub maximum_request_length: u32,
    pub image_byte_order: ByteOrder,
    pub bitmap_format_bit_order: ByteOrder,
    pub bitmap_format_scanline_unit: u8,
    pub bitmap_format_scanline_pad: u8,
    pub min_keycode: u8,
    pub max_keycode: u8,
    pub vendor: String,
    pub pixmap_formats: Vec<PixmapFormat>,
    pub screens: Vec<Screen>,
}

impl SetupInfo {
    /// Decode the body that follows the 8-byte status header
    fn decode(
        protocol_major_version: u16,
        protocol_minor_version: u16,
        r: &mut WireReader,
    ) -> Result<Self, WireError> {
        let release_number = r.card32()?;
        let resource_id_base = r.card32()?;
        let resource_id_mask = r.card32()?;
        let motion_buffer_size = r.card32()?;
        let vendor_length = r.card16()? as usize;
        let maximum_request_length = r.card16()? as u32;
        let screens_length = r.card8()? as usize;
        let pixmap_formats_length = r.card8()? as usize;
        let image_byte_order = ByteOrder::from_u8(r.card8()?);
        let bitmap_format_bit_order = ByteOrder::from_u8(r.card8()?);
        let bitmap_format_scanline_unit = r.card8()?;
        let bitmap_format_scanline_pad = r.card8()?;
        let min_keycode = r.card8()?;
        let max_keycode = r.card8()?;
        r.padding(4)?;
        let vendor = r.string8(vendor_length)?;
        r.align()?;
        let pixmap_formats = (0..pixmap_formats_length)
            .map(|_| PixmapFormat::decode(r))
            .collect::<Result<_, _>>()?;
        let screens = (0..screens_length)
            .map(|_| Screen::decode(r))
            .collect::<Result<_, _>>()?;

        Ok(SetupInfo {
            protocol_major_version,
            protocol_minor_version,
            release_number,
            resource_id_base,
            resource_id_mask,
            motion_buffer_size,
            maximum_request_length,
            image_byte_order,
            bitmap_format_bit_order,
            bitmap_format_scanline_unit,
            bitmap_format_scanline_pad,
            min_keycode,
            max_keycode,
            vendor,
            pixmap_formats,
            screens,
        })
    }

    /// Encode as a server would send it
    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut body = WireWriter::new();
        body.card32(self.release_number)
            .card32(self.resource_id_base)
            .card32(self.resource_id_mask)
            .card32(self.motion_buffer_size)
            .card16(self.vendor.len() as u16)
            .card16(self.maximum_request_length.min(0xffff) as u16)
            .card8(self.screens.len() as u8)
            .card8(self.pixmap_formats.len() as u8)
            .card8(self.image_byte_order as u8)
            .card8(self.bitmap_format_bit_order as u8)
            .card8(self.bitmap_format_scanline_unit)
            .card8(self.bitmap_format_scanline_pad)
            .card8(self.min_keycode)
            .card8(self.max_keycode)
            .padding(4)
            .string8(&self.vendor)
            .align();
        for format in &self.pixmap_formats {
            format.encode(&mut body);
        }
        for screen in &self.screens {
            screen.encode(&mut body);
        }

        let mut w = WireWriter::new();
        w.card8(SetupStatus::Success as u8)
            .padding(1)
            .card16(self.protocol_major_version)
            .card16(self.protocol_minor_version)
            .card16((body.len() / 4) as u16)
            .bytes(body.as_bytes());
        let (data, _) = w.into_parts();
        data
    }

    /// Screen with the given index, if the server has one
    pub fn screen(&self, index: usize) -> Option<&Screen> {
        self.screens.get(index)
    }
}

/// Setup failed (or authentication required) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFailed {
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub reason: String,
}

impl SetupFailed {
    /// Encode as a server would send a refusal
    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.card8(SetupStatus::Failed as u8)
            .card8(self.reason.len() as u8)
            .card16(self.protocol_major_version)
            .card16(self.protocol_minor_version)
            .card16((padded_len(self.reason.len()) / 4) as u16)
            .string8(&self.reason)
            .align();
        let (data, _) = w.into_parts();
        data
    }
}

/// Setup response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupResponse {
    Success(SetupInfo),
    Failed(SetupFailed),
    Authenticate(String),
}

impl SetupResponse {
    /// Parse a setup response from the start of `data`.
    ///
    /// Returns `Ok(None)` until the whole `(length + 2) * 4` byte record is
    /// buffered, then the response and the number of bytes it occupied.
    pub fn parse(data: &[u8]) -> Result<Option<(Self, usize)>, ClientError> {
        if data.len() < 8 {
            return Ok(None);
        }
        let mut r = WireReader::new(data);
        let status = r.card8()?;
        let reason_length = r.card8()? as usize;
        let protocol_major_version = r.card16()?;
        let protocol_minor_version = r.card16()?;
        let length = r.card16()? as usize;
        let message_length = (length + 2) * 4;
        if data.len() < message_length {
            return Ok(None);
        }

        let mut r = WireReader::new(&data[8..message_length]);
        let response = match SetupStatus::from_u8(status) {
            Some(SetupStatus::Success) => SetupResponse::Success(SetupInfo::decode(
                protocol_major_version,
                protocol_minor_version,
                &mut r,
            )?),
            Some(SetupStatus::Failed) => SetupResponse::Failed(SetupFailed {
                protocol_major_version,
                protocol_minor_version,
                reason: r.string8(reason_length)?,
            }),
            // The reason here runs to the end of the record, NUL padded
            Some(SetupStatus::Authenticate) => {
                let reason = r.string8(r.remaining())?;
                SetupResponse::Authenticate(reason.trim_end_matches('\0').to_string())
            }
            None => {
                log::warn!("Unknown setup status {}", status);
                return Err(ClientError::Connection(format!(
                    "unknown setup status {}",
                    status
                )));
            }
        };
        Ok(Some((response, message_length)))
    }
}

/// Setup record resembling a stock X.Org server, for tests
#[cfg(test)]
pub(crate) fn sample_setup() -> SetupInfo {
    SetupInfo {
        protocol_major_version: 11,
        protocol_minor_version: 0,
        release_number: 12101004,
        resource_id_base: 0x00200000,
        resource_id_mask: 0x001fffff,
        motion_buffer_size: 256,
        maximum_request_length: 0xffff,
        image_byte_order: ByteOrder::LSBFirst,
        bitmap_format_bit_order: ByteOrder::LSBFirst,
        bitmap_format_scanline_unit: 32,
        bitmap_format_scanline_pad: 32,
        min_keycode: 8,
        max_keycode: 255,
        vendor: "The X.Org Foundation".to_string(),
        pixmap_formats: vec![PixmapFormat {
            depth: 24,
            bits_per_pixel: 32,
            scanline_pad: 32,
        }],
        screens: vec![Screen {
            root: Window::new(0x3c7),
            default_colormap: Colormap::new(0x20),
            white_pixel: 0xffffff,
            black_pixel: 0,
            current_input_masks: 0,
            width_in_pixels: 1920,
            height_in_pixels: 1080,
            width_in_millimeters: 508,
            height_in_millimeters: 285,
            min_installed_maps: 1,
            max_installed_maps: 1,
            root_visual: VisualID(0x21),
            backing_stores: 0,
            save_unders: false,
            root_depth: 24,
            allowed_depths: vec![Depth {
                depth: 24,
                visuals: vec![VisualType {
                    visual_id: VisualID(0x21),
                    class: 4,
                    bits_per_rgb_value: 8,
                    colormap_entries: 256,
                    red_mask: 0xff0000,
                    green_mask: 0xff00,
                    blue_mask: 0xff,
                }],
            }],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_request_packet() {
        let packet = SetupRequest::default().encode();
        assert_eq!(packet, vec![0x6c, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_parse_success() {
        let info = sample_setup();
        let bytes = info.encode();
        let (response, used) = SetupResponse::parse(&bytes).unwrap().unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(response, SetupResponse::Success(info.clone()));
        let screen = info.screen(0).unwrap();
        assert_eq!(screen.find_visual(VisualID(0x21)).map(|(d, _)| d), Some(24));
    }

    #[test]
    fn test_parse_needs_more_data() {
        let bytes = sample_setup().encode();
        assert!(SetupResponse::parse(&bytes[..4]).unwrap().is_none());
        assert!(SetupResponse::parse(&bytes[..bytes.len() - 1]).unwrap().is_none());
    }

    #[test]
    fn test_parse_failed() {
        let failed = SetupFailed {
            protocol_major_version: 11,
            protocol_minor_version: 0,
            reason: "No protocol specified".to_string(),
        };
        let mut bytes = failed.encode();
        let total = bytes.len();
        bytes.extend_from_slice(&[1, 2, 3]);
        let (response, used) = SetupResponse::parse(&bytes).unwrap().unwrap();
        assert_eq!(used, total);
        assert_eq!(response, SetupResponse::Failed(failed));
    }
}
