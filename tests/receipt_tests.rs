//! # Receipt Tests
//!
//! End-to-end formatting of the water bill on every printer family.
//!
//! The character-mode families are checked byte for byte. The raster family
//! is checked structurally (bands, no raw text) since its bytes depend on
//! the bitmap font.

use pretty_assertions::assert_eq;

use printer_drivers::assets::{DirAssetStore, NoAssets};
use printer_drivers::buffer::DEFAULT_CAPACITY;
use printer_drivers::driver::{DirectTextDriver, Driver, LinePaddedDriver};
use printer_drivers::printer::{PrinterFamily, PrinterProfile};
use printer_drivers::receipt::{ReceiptFields, Template, format_receipt};
use printer_drivers::{AlignedText, PrinterError};

fn fields(pairs: &[(&str, &str)]) -> ReceiptFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn minimal_bill() -> ReceiptFields {
    fields(&[("tenCongTy", "ABC Co"), ("ky", "01/2024"), ("tienNuoc", "150000")])
}

fn full_bill() -> ReceiptFields {
    fields(&[
        ("tenCongTy", "Công ty Cấp nước ABC"),
        ("diaChiCongTy", "12 Lê Lợi, Quận 1, TP.HCM"),
        ("dienThoai", "028 3822 1234"),
        ("ky", "01/2024"),
        ("maKhachHang", "KH0123456"),
        ("tenKhachHang", "Nguyễn Văn An"),
        ("diaChi", "45 Trần Hưng Đạo, Phường Cầu Ông Lãnh, Quận 1"),
        ("chiSoCu", "120"),
        ("chiSoMoi", "132"),
        ("tieuThu", "12"),
        ("tienNuoc", "150000"),
        ("thueVat", "7500"),
        ("phiBvmt", "15000"),
        ("tongCong", "172500"),
        ("nhanVien", "Trần Thị B"),
        ("ngayIn", "15/01/2024"),
    ])
}

fn format(family: PrinterFamily, fields: &ReceiptFields) -> Vec<u8> {
    let mut driver = family.driver(DEFAULT_CAPACITY);
    format_receipt(Template::WaterBill, fields, driver.as_mut(), &NoAssets).unwrap()
}

/// `ESC a n` + `ESC E b` + `GS ! 0`
fn style(align: u8, bold: bool) -> Vec<u8> {
    vec![0x1B, b'a', align, 0x1B, b'E', bold as u8, 0x1D, b'!', 0x00]
}

fn reset() -> Vec<u8> {
    style(0, false)
}

fn line(align: u8, bold: bool, text: &str) -> Vec<u8> {
    let mut out = style(align, bold);
    out.extend_from_slice(text.as_bytes());
    out.push(b'\n');
    out.extend(reset());
    out
}

fn rule(glyph: u8, len: usize) -> Vec<u8> {
    let mut out = vec![0x1B, b'a', 0x00];
    out.extend(std::iter::repeat_n(glyph, len));
    out.push(b'\n');
    out
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ============================================================================
// DIRECT TEXT (WOOSIM)
// ============================================================================

#[test]
fn test_woosim_minimal_bill_bytes() {
    let job = format(PrinterFamily::WoosimWspI350, &minimal_bill());

    let mut expected = vec![0x1B, b'@'];
    expected.extend(rule(b'-', 35));
    expected.extend(line(1, true, "ABC Co"));
    expected.extend(line(1, true, "GIẤY BÁO TIỀN NƯỚC"));
    expected.extend(line(1, false, "KỲ: 01/2024"));
    expected.extend(rule(b'-', 35));
    expected.extend(rule(b'-', 35));
    // "Tiền nước:" then a tab to column 25 and the bold amount
    expected.extend([0x1B, b'D', 25, 0x00]);
    expected.extend("Tiền nước:".as_bytes());
    expected.push(0x09);
    expected.extend([0x1B, b'E', 1]);
    expected.extend("150000 VND".as_bytes());
    expected.extend([0x1B, b'E', 0]);
    expected.push(b'\n');
    expected.extend([0x1B, b'D', 0x00]);
    expected.extend(rule(b'-', 35));
    expected.extend(line(1, false, "Xin cảm ơn quý khách!"));
    expected.extend([0x1B, b'd', 3]);

    assert_eq!(job, expected);
}

#[test]
fn test_woosim_right_aligned_text_keeps_trailing_space() {
    let mut driver = DirectTextDriver::new(PrinterProfile::WOOSIM_WSP_I350, DEFAULT_CAPACITY);
    driver.emit_aligned_text(&AlignedText::new("150000 VND").right()).unwrap();
    assert_eq!(driver.flush(), line(2, false, "150000 VND "));
}

#[test]
fn test_woosim_long_line_wraps_at_word_boundary() {
    let mut driver = DirectTextDriver::new(PrinterProfile::WOOSIM_WSP_I350, DEFAULT_CAPACITY);
    driver
        .emit_aligned_text(&AlignedText::new(
            "45 Trần Hưng Đạo, Phường Cầu Ông Lãnh, Quận 1",
        ))
        .unwrap();
    let job = driver.flush();
    let body = String::from_utf8_lossy(&job[9..job.len() - 9]).to_string();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines, vec!["45 Trần Hưng Đạo, Phường Cầu Ông", "Lãnh, Quận 1"]);
    assert!(lines.iter().all(|l| l.chars().count() <= 35));
}

// ============================================================================
// LINE PADDED (HONEYWELL 0188)
// ============================================================================

#[test]
fn test_0188_amount_line_is_padded_to_page_edge() {
    let job = format(PrinterFamily::Honeywell0188, &minimal_bill());

    let mut amount = "Tiền nước:".as_bytes().to_vec();
    amount.extend(std::iter::repeat_n(b' ', 28));
    amount.extend([0x1B, b'E', 1]);
    amount.extend("150000 VND".as_bytes());
    amount.extend([0x1B, b'E', 0]);
    amount.push(b'\n');

    assert!(contains(&job, &amount));
    assert!(contains(&job, &rule(b'=', 48)));
    assert!(!contains(&job, &[0x1B, b'D']), "0188 must not use tab stops");
    assert!(job.ends_with(b"\n\n\n"));
}

#[test]
fn test_0188_meter_columns() {
    let mut driver = LinePaddedDriver::new(PrinterProfile::HONEYWELL_0188, DEFAULT_CAPACITY);
    driver
        .emit_three_column_text(
            &AlignedText::new("120"),
            &AlignedText::new("132"),
            &AlignedText::new("12 m3"),
        )
        .unwrap();
    let job = driver.flush();
    let expected = format!("120{}132{}12 m3\n", " ".repeat(30), " ".repeat(7));
    assert_eq!(String::from_utf8(job).unwrap(), expected);
}

// ============================================================================
// RASTER (HONEYWELL PR3)
// ============================================================================

#[test]
fn test_pr3_job_is_all_raster_bands() {
    let job = format(PrinterFamily::HoneywellPr3, &full_bill());

    assert_eq!(&job[..2], &[0x1B, b'V'], "no init bytes before the first band");
    assert_eq!(job[4], 72, "bands span the full 576-dot head");
    assert!(!contains(&job, "ABC".as_bytes()));
    assert!(!contains(&job, "VND".as_bytes()));
    assert!(job.ends_with(b"\n\n\n"));
}

#[test]
fn test_pr3_missing_qr_file_is_plain_text_error() {
    let mut bill = minimal_bill();
    bill.insert("qrFile".into(), "qr-code.png".into());
    let dir = std::env::temp_dir().join(format!("printer-drivers-receipt-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let assets = DirAssetStore::new(&dir, 576);

    let mut driver = PrinterFamily::HoneywellPr3.driver(DEFAULT_CAPACITY);
    let job = format_receipt(Template::WaterBill, &bill, driver.as_mut(), &assets).unwrap();
    assert!(contains(&job, b"ERROR: qr-code.png not found\r\n"));
}

// ============================================================================
// ALL FAMILIES
// ============================================================================

#[test]
fn test_formatting_is_deterministic() {
    for family in PrinterFamily::ALL {
        let first = format(family, &full_bill());
        let second = format(family, &full_bill());
        assert_eq!(first, second, "{} output differs between runs", family);
    }
}

#[test]
fn test_driver_is_reusable_across_jobs() {
    for family in PrinterFamily::ALL {
        let mut driver = family.driver(DEFAULT_CAPACITY);
        let a = format_receipt(Template::WaterBill, &full_bill(), driver.as_mut(), &NoAssets).unwrap();
        let b = format_receipt(Template::WaterBill, &full_bill(), driver.as_mut(), &NoAssets).unwrap();
        assert_eq!(a, b);
        assert!(driver.buffer().is_empty());
    }
}

#[test]
fn test_full_bill_with_payment_qr_fits_default_buffers() {
    let mut bill = full_bill();
    bill.insert(
        "noiDungQr".into(),
        "00020101021238570010A00000072701270006970436011300110123456780208QRIBFTTA53037045405172500".into(),
    );
    for family in PrinterFamily::ALL {
        let mut driver = family.default_driver();
        let job = format_receipt(Template::WaterBill, &bill, driver.as_mut(), &NoAssets)
            .unwrap_or_else(|e| panic!("{}: {}", family, e));
        assert!(job.len() <= family.profile().buffer_capacity);
    }
}

#[test]
fn test_empty_text_is_a_no_op_everywhere() {
    for family in PrinterFamily::ALL {
        let mut driver = family.driver(DEFAULT_CAPACITY);
        driver.emit_aligned_text(&AlignedText::new("")).unwrap();
        driver.emit_aligned_text(&AlignedText::new("\n").bold()).unwrap();
        driver
            .emit_two_column_text(&AlignedText::new(""), &AlignedText::new(""))
            .unwrap();
        driver
            .emit_three_column_text(&AlignedText::new(""), &AlignedText::new(""), &AlignedText::new(""))
            .unwrap();
        assert!(driver.flush().is_empty(), "{} emitted bytes for empty text", family);
    }
}

#[test]
fn test_full_bill_includes_every_section() {
    let job = format(PrinterFamily::Honeywell0188, &full_bill());
    let text = String::from_utf8_lossy(&job);
    for needle in [
        "Công ty Cấp nước ABC",
        "ĐT: 028 3822 1234",
        "Mã KH: KH0123456",
        "Chỉ số cũ",
        "12 m3",
        "172500 VND",
        "Nhân viên: Trần Thị B",
        "Ngày in: 15/01/2024",
    ] {
        assert!(text.contains(needle), "missing {:?}", needle);
    }
}

#[test]
fn test_tiny_buffer_overflows() {
    for family in PrinterFamily::ALL {
        let mut driver = family.driver(64);
        let err = format_receipt(Template::WaterBill, &full_bill(), driver.as_mut(), &NoAssets)
            .unwrap_err();
        assert!(matches!(err, PrinterError::BufferOverflow { .. }), "{}: {:?}", family, err);
    }
}
