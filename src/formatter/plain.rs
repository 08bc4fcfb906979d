use super::OutputFormatter;
use std::io::Write;
use crate::edid::Descriptor;
use crate::edid::Finding;
use crate::edid::Identification;
use crate::edid::descriptor::{DetailedTiming, RangeLimits, SyncType};
use crate::edid::extension::{DataBlock, DataBlockPayload, SectionHeader, TiledTopology, VideoTiming};
use crate::edid::fields::{BasicDisplayParameters, Chromaticity, EstablishedTimings, StandardTiming, VideoInput};
use crate::scan::ScanEntry;

pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        PlainFormatter
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn polarity(positive: bool) -> char {
    if positive { '+' } else { '-' }
}

fn section(w: &mut dyn Write, title: &str) -> std::io::Result<()> {
    writeln!(w, "\n{title}:")?;
    writeln!(w, "{}", "-".repeat(title.len() + 1))
}

fn detailed_timing(w: &mut dyn Write, dtd: &DetailedTiming) -> std::io::Result<()> {
    writeln!(
        w,
        "      {}x{}{} @ {:.2}Hz, pixel clock {:.2} MHz",
        dtd.h_active,
        dtd.v_active,
        if dtd.features.interlaced { "i" } else { "p" },
        dtd.refresh_rate(),
        dtd.pixel_clock_mhz
    )?;
    writeln!(
        w,
        "      Horizontal: blanking {}, front porch {}, sync {}, total {}",
        dtd.h_blanking, dtd.h_front_porch, dtd.h_sync_pulse, dtd.h_total()
    )?;
    writeln!(
        w,
        "      Vertical: blanking {}, front porch {}, sync {}, total {}",
        dtd.v_blanking, dtd.v_front_porch, dtd.v_sync_pulse, dtd.v_total()
    )?;
    writeln!(w, "      Image size: {} x {} mm", dtd.h_image_size_mm, dtd.v_image_size_mm)?;
    if dtd.h_border != 0 || dtd.v_border != 0 {
        writeln!(w, "      Borders: {} x {} pixels", dtd.h_border, dtd.v_border)?;
    }
    writeln!(w, "      Stereo: {}", dtd.features.stereo.description())?;

    match dtd.features.sync {
        SyncType::Analog { bipolar, serrated, sync_on_rgb } => writeln!(
            w,
            "      Sync: analog composite, bipolar {}, serrated {}, sync on {}",
            yes_no(bipolar),
            yes_no(serrated),
            if sync_on_rgb { "RGB" } else { "green" }
        ),
        SyncType::DigitalComposite { serrated, hsync_positive } => writeln!(
            w,
            "      Sync: digital composite, serrated {}, hsync {}",
            yes_no(serrated),
            polarity(hsync_positive)
        ),
        SyncType::DigitalSeparate { vsync_positive, hsync_positive } => writeln!(
            w,
            "      Sync: digital separate, hsync {}, vsync {}",
            polarity(hsync_positive),
            polarity(vsync_positive)
        ),
    }
}

fn range_limits(w: &mut dyn Write, limits: &RangeLimits) -> std::io::Result<()> {
    writeln!(w, "      Vertical: {}-{} Hz", limits.min_vertical_hz, limits.max_vertical_hz)?;
    writeln!(w, "      Horizontal: {}-{} kHz", limits.min_horizontal_khz, limits.max_horizontal_khz)?;
    writeln!(w, "      Max pixel clock: {} MHz", limits.max_pixel_clock_mhz)?;
    writeln!(w, "      Timing: {}", limits.timing_type.description())
}

fn tiled_topology(w: &mut dyn Write, tile: &TiledTopology) -> std::io::Result<()> {
    writeln!(w, "      Single enclosure: {}", yes_no(tile.single_enclosure))?;
    writeln!(w, "      Single tile behavior: {}", tile.single_tile_behavior.description())?;
    writeln!(w, "      Multi tile behavior: {}", tile.multi_tile_behavior.description())?;
    writeln!(w, "      Topology: {} columns x {} rows", tile.columns, tile.rows)?;
    writeln!(w, "      Location: column {}, row {}", tile.column_location, tile.row_location)?;
    writeln!(w, "      Tile size: {} x {}", tile.tile_width, tile.tile_height)?;
    if let Some(bezel) = &tile.bezel {
        writeln!(
            w,
            "      Bezel: top {:.1}, bottom {:.1}, right {:.1}, left {:.1} pixels",
            bezel.top, bezel.bottom, bezel.right, bezel.left
        )?;
    }
    writeln!(
        w,
        "      Vendor: {}, product 0x{:04x}, serial {}",
        tile.vendor_id, tile.product_code, tile.serial_number
    )
}

fn video_timing(w: &mut dyn Write, timing: &VideoTiming) -> std::io::Result<()> {
    writeln!(
        w,
        "      {}x{}{} @ {:.2}Hz ({}), pixel clock {:.2} MHz{}",
        timing.h_active,
        timing.v_active,
        if timing.interlaced { "i" } else { "p" },
        timing.refresh_hz,
        timing.aspect_ratio.as_str(),
        timing.pixel_clock_mhz,
        if timing.preferred { ", preferred" } else { "" }
    )?;
    writeln!(
        w,
        "        H: {} {} {} {} total {} hsync {}",
        timing.h_active,
        timing.h_front_porch,
        timing.h_sync_width,
        timing.h_back_porch,
        timing.h_total,
        polarity(timing.h_sync_positive)
    )?;
    writeln!(
        w,
        "        V: {} {} {} {} total {} vsync {}",
        timing.v_active,
        timing.v_front_porch,
        timing.v_sync_width,
        timing.v_back_porch,
        timing.v_total,
        polarity(timing.v_sync_positive)
    )
}

impl OutputFormatter for PlainFormatter {
    fn begin_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn begin_record(&mut self, w: &mut dyn Write, source: &str) -> std::io::Result<()> {
        writeln!(w, "EDID record from {source}:")?;
        writeln!(w, "{}=", "=".repeat(17 + source.len()))
    }

    fn end_record(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn identification(&mut self, w: &mut dyn Write, id: &Identification, header_valid: bool) -> std::io::Result<()> {
        writeln!(w, "Header: {}", if header_valid { "valid" } else { "INVALID" })?;
        writeln!(w, "Version: {}.{}", id.version, id.revision)?;
        writeln!(w, "Manufacturer: {}", id.manufacturer_id)?;
        writeln!(w, "Product code: 0x{:04x} ({})", id.product_code, id.product_code)?;
        writeln!(w, "Serial number: 0x{:08x} ({})", id.serial_number, id.serial_number)?;
        if id.model_year {
            writeln!(w, "Model year: {}", id.year_of_manufacture)
        } else {
            writeln!(w, "Manufactured: week {}, {}", id.week_of_manufacture, id.year_of_manufacture)
        }
    }

    fn basic_display(&mut self, w: &mut dyn Write, bdp: &BasicDisplayParameters) -> std::io::Result<()> {
        section(w, "Basic display parameters")?;
        match bdp.video_input {
            VideoInput::Digital { bit_depth, interface } => {
                writeln!(w, "  Input: digital, {}, {}", bit_depth.description(), interface.description())?;
            }
            VideoInput::Analog {
                signal_level,
                blank_to_black_setup,
                separate_sync,
                composite_sync,
                sync_on_green,
                vsync_serrated,
            } => {
                writeln!(w, "  Input: analog, signal level {}", signal_level.description())?;
                writeln!(w, "    Blank-to-black setup: {}", yes_no(blank_to_black_setup))?;
                writeln!(w, "    Separate sync: {}", yes_no(separate_sync))?;
                writeln!(w, "    Composite sync: {}", yes_no(composite_sync))?;
                writeln!(w, "    Sync on green: {}", yes_no(sync_on_green))?;
                writeln!(w, "    VSync serrated: {}", yes_no(vsync_serrated))?;
            }
        }
        writeln!(w, "  Screen size: {} x {} cm", bdp.max_horizontal_size_cm, bdp.max_vertical_size_cm)?;
        writeln!(w, "  Gamma: {:.2}", bdp.gamma)?;

        let features = &bdp.features;
        let mut dpms = Vec::new();
        if features.dpms_standby {
            dpms.push("standby");
        }
        if features.dpms_suspend {
            dpms.push("suspend");
        }
        if features.dpms_active_off {
            dpms.push("active-off");
        }
        if !dpms.is_empty() {
            writeln!(w, "  DPMS: {}", dpms.join(" | "))?;
        }
        writeln!(w, "  Color type: {}", features.color_type.description())?;
        writeln!(w, "  sRGB default: {}", yes_no(features.srgb_default))?;
        writeln!(w, "  Preferred timing is native: {}", yes_no(features.preferred_timing_native))?;
        writeln!(w, "  Continuous frequency: {}", yes_no(features.continuous_frequency))
    }

    fn chromaticity(&mut self, w: &mut dyn Write, cc: &Chromaticity) -> std::io::Result<()> {
        section(w, "Chromaticity")?;
        writeln!(w, "  Red:   {:.4}, {:.4}", cc.red_x, cc.red_y)?;
        writeln!(w, "  Green: {:.4}, {:.4}", cc.green_x, cc.green_y)?;
        writeln!(w, "  Blue:  {:.4}, {:.4}", cc.blue_x, cc.blue_y)?;
        writeln!(w, "  White: {:.4}, {:.4}", cc.white_x, cc.white_y)
    }

    fn established_timings(&mut self, w: &mut dyn Write, et: &EstablishedTimings) -> std::io::Result<()> {
        section(w, "Established timings")?;
        if et.timings.is_empty() {
            writeln!(w, "  (none)")?;
        }
        for timing in &et.timings {
            writeln!(w, "  {timing}")?;
        }
        if et.manufacturer_reserved != 0 {
            writeln!(w, "  Manufacturer reserved: 0x{:02x}", et.manufacturer_reserved)?;
        }
        Ok(())
    }

    fn begin_standard_timings(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        section(w, &format!("Standard timings ({count})"))
    }

    fn standard_timing(&mut self, w: &mut dyn Write, timing: &StandardTiming) -> std::io::Result<()> {
        writeln!(w, "  [{}] {timing}", timing.index)
    }

    fn end_standard_timings(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn begin_descriptors(&mut self, w: &mut dyn Write) -> std::io::Result<()> {
        section(w, "Descriptors")
    }

    fn descriptor(&mut self, w: &mut dyn Write, slot: usize, descriptor: &Descriptor) -> std::io::Result<()> {
        writeln!(w, "  [{slot}] {}", descriptor.title())?;
        match descriptor {
            Descriptor::DetailedTiming(dtd) => detailed_timing(w, dtd),
            Descriptor::RangeLimits(limits) => range_limits(w, limits),
            Descriptor::MonitorName { text }
            | Descriptor::MonitorSerial { text }
            | Descriptor::Unspecified { text }
            | Descriptor::ManufacturerSpecific { text } => writeln!(w, "      \"{text}\""),
            Descriptor::StandardTimingId { timings } => {
                for timing in timings {
                    writeln!(w, "      {timing}")?;
                }
                Ok(())
            }
            Descriptor::Reserved { tag } => writeln!(w, "      Tag: 0x{tag:02x}"),
            _ => Ok(()),
        }
    }

    fn end_descriptors(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn checksum(&mut self, w: &mut dyn Write, extension_flag: u8, checksum: u8, valid: bool) -> std::io::Result<()> {
        writeln!(w)?;
        writeln!(w, "Extension blocks: {extension_flag}")?;
        writeln!(w, "Checksum: 0x{checksum:02x} ({})", if valid { "valid" } else { "INVALID" })
    }

    fn begin_extension(&mut self, w: &mut dyn Write, header: &SectionHeader, checksum_valid: bool) -> std::io::Result<()> {
        section(w, "Extension block")?;
        writeln!(w, "  Tag: 0x{:02x}", header.extension_tag)?;
        writeln!(w, "  DisplayID version: {}.{}", header.version, header.revision)?;
        writeln!(w, "  Payload length: {}", header.payload_length)?;
        writeln!(w, "  Primary use case: 0x{:02x}", header.primary_use_case)?;
        writeln!(w, "  Extension count: {}", header.extension_count)?;
        writeln!(w, "  Checksum: {}", if checksum_valid { "valid" } else { "INVALID" })
    }

    fn data_block(&mut self, w: &mut dyn Write, block: &DataBlock) -> std::io::Result<()> {
        writeln!(
            w,
            "  [0x{:02x}] {} (tag 0x{:02x}, revision {}, {} bytes)",
            block.offset,
            block.payload.title(),
            block.tag,
            block.revision,
            block.payload_length
        )?;
        match &block.payload {
            DataBlockPayload::TiledTopology(tile) => tiled_topology(w, tile),
            DataBlockPayload::VideoTimingType1(timings) => {
                for timing in timings {
                    video_timing(w, timing)?;
                }
                Ok(())
            }
        }
    }

    fn end_extension(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn begin_findings(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        if count > 0 {
            section(w, &format!("Findings ({count})"))?;
        }
        Ok(())
    }

    fn finding(&mut self, w: &mut dyn Write, finding: &Finding) -> std::io::Result<()> {
        writeln!(w, "  {finding}")
    }

    fn end_findings(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn output_written(&mut self, w: &mut dyn Write, path: &str, len: usize) -> std::io::Result<()> {
        writeln!(w, "\nWrote {len} bytes to {path}")
    }

    fn begin_scan(&mut self, w: &mut dyn Write, root: &str) -> std::io::Result<()> {
        section(w, &format!("Displays under {root}"))
    }

    fn scan_entry(&mut self, w: &mut dyn Write, entry: &ScanEntry) -> std::io::Result<()> {
        let connector = entry.connector.as_deref().unwrap_or("?");
        writeln!(w, "  {connector}: {} ({} bytes)", entry.path, entry.size)?;
        if let Some(display) = &entry.display {
            writeln!(
                w,
                "      {} 0x{:04x}, serial {}{}",
                display.manufacturer_id,
                display.product_code,
                display.serial_number,
                display.monitor_name.as_deref().map(|n| format!(", \"{n}\"")).unwrap_or_default()
            )?;
            if display.finding_count > 0 {
                writeln!(w, "      {} finding(s)", display.finding_count)?;
            }
        }
        if let Some(error) = &entry.error {
            writeln!(w, "      Error: {error}")?;
        }
        Ok(())
    }

    fn end_scan(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        writeln!(w, "\nTotal displays found: {count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edid::{Edid, display_report, testdata};

    fn render(bytes: &[u8]) -> String {
        let report = Edid::decode(bytes).unwrap().parse();
        let mut formatter = PlainFormatter::new();
        let mut out = Vec::new();
        formatter.begin_document(&mut out).unwrap();
        display_report(&report, "test.bin", &mut formatter, &mut out).unwrap();
        formatter.end_document(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_base_record() {
        let text = render(&testdata::base_record());

        assert!(text.starts_with("EDID record from test.bin:\n"));
        assert!(text.contains("Manufacturer: OPS"));
        assert!(text.contains("Product code: 0x1080"));
        assert!(text.contains("Manufactured: week 12, 2023"));
        assert!(text.contains("[0] Detailed timing"));
        assert!(text.contains("1920x1080p @ 60.00Hz, pixel clock 148.50 MHz"));
        assert!(text.contains("[1] Monitor name"));
        assert!(text.contains("\"OPS-1080\""));
        assert!(text.contains("Checksum: 0x"));
        assert!(!text.contains("Findings"));
    }

    #[test]
    fn test_plain_dpms_flags() {
        let mut bytes = testdata::base_record();
        // Analog input, standby + suspend + active-off, RGB colour
        bytes[20] = 0x0E;
        bytes[24] = 0xE8;
        bytes[127] = crate::edid::checksum::compute(&bytes[..127]);
        let text = render(&bytes);

        assert!(text.contains("Input: analog, signal level 0.7/0.3 V"));
        assert!(text.contains("  DPMS: standby | suspend | active-off\n"));
        assert!(text.contains("Color type: RGB color"));
    }

    #[test]
    fn test_plain_extension_and_findings() {
        let mut bytes = testdata::extended_record();
        bytes[127] ^= 0xFF;
        let text = render(&bytes);

        assert!(text.contains("Extension block:"));
        assert!(text.contains("Tiled display topology"));
        assert!(text.contains("Topology: 2 columns x 1 rows"));
        assert!(text.contains("Video timing block type 1"));
        assert!(text.contains("1920x2160p @ 60.00Hz (16:9)"));
        assert!(text.contains("Findings (1):"));
        assert!(text.contains("[checksum mismatch]"));
    }
}
