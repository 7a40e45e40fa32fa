//! # Receipt Templates
//!
//! Turns a field map into an ordered sequence of [`Driver`] operations.
//!
//! The same template drives every printer family; only the bytes differ.
//! Formatting is deterministic: the field map is a `BTreeMap` and nothing
//! time- or environment-dependent is read, so identical inputs give
//! byte-identical jobs.
//!
//! ## Water Bill (`water-bill`)
//!
//! ```text
//! ---------------------------------
//!            ABC Co               <- tenCongTy (bold)
//!      12 Lê Lợi, Quận 1          <- diaChiCongTy
//!          ĐT: 028 3822           <- dienThoai
//!      GIẤY BÁO TIỀN NƯỚC
//!          KỲ: 01/2024            <- ky
//! ---------------------------------
//! Mã KH: 0123456                  <- maKhachHang
//! Tên KH: Nguyễn Văn An           <- tenKhachHang
//! Địa chỉ: ...                    <- diaChi
//! Chỉ số cũ   Chỉ số mới  Tiêu thụ
//! 120         132         12 m3   <- chiSoCu / chiSoMoi / tieuThu
//! ---------------------------------
//! Tiền nước:            150000 VND <- tienNuoc
//! Thuế VAT:               7500 VND <- thueVat
//! Phí BVMT:              15000 VND <- phiBvmt
//! Tổng cộng:            172500 VND <- tongCong
//! ---------------------------------
//! ghiChu / nhanVien / ngayIn
//!     Xin cảm ơn quý khách!
//!         [payment QR]             <- qrFile or noiDungQr
//! ```
//!
//! Every field is optional. A missing or blank field drops its whole line.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::assets::AssetStore;
use crate::driver::{AlignedText, Driver};
use crate::error::PrinterError;
use crate::layout::TextRaster;
use crate::protocol::text::Alignment;

/// Label → value input for one receipt.
pub type ReceiptFields = BTreeMap<String, String>;

/// Field keys understood by the water-bill template.
pub mod fields {
    pub const TEN_CONG_TY: &str = "tenCongTy";
    pub const DIA_CHI_CONG_TY: &str = "diaChiCongTy";
    pub const DIEN_THOAI: &str = "dienThoai";
    pub const KY: &str = "ky";
    pub const MA_KHACH_HANG: &str = "maKhachHang";
    pub const TEN_KHACH_HANG: &str = "tenKhachHang";
    pub const DIA_CHI: &str = "diaChi";
    pub const CHI_SO_CU: &str = "chiSoCu";
    pub const CHI_SO_MOI: &str = "chiSoMoi";
    pub const TIEU_THU: &str = "tieuThu";
    pub const TIEN_NUOC: &str = "tienNuoc";
    pub const THUE_VAT: &str = "thueVat";
    pub const PHI_BVMT: &str = "phiBvmt";
    pub const TONG_CONG: &str = "tongCong";
    pub const GHI_CHU: &str = "ghiChu";
    pub const NHAN_VIEN: &str = "nhanVien";
    pub const NGAY_IN: &str = "ngayIn";
    pub const QR_FILE: &str = "qrFile";
    pub const NOI_DUNG_QR: &str = "noiDungQr";
}

/// Largest dots per QR module when the code is generated from a payload.
/// Long payloads get smaller modules so the code fits the head.
const QR_CELL_SIZE: usize = 6;

/// Feed after the last element so the tear bar clears the QR code.
const TRAILING_FEED: u8 = 3;

/// Receipt layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Template {
    /// Giấy báo tiền nước: monthly water bill notice
    #[default]
    WaterBill,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::WaterBill => "water-bill",
        }
    }
}

impl FromStr for Template {
    type Err = PrinterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "water-bill" | "giay-bao-tien-nuoc" => Ok(Template::WaterBill),
            other => Err(PrinterError::Config(format!("unknown template '{}'", other))),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// FORMATTER
// ============================================================================

/// One format call: a template applied to a field map on a bound driver.
pub struct ReceiptFormatter<'a> {
    driver: &'a mut dyn Driver,
    fields: &'a ReceiptFields,
    assets: &'a dyn AssetStore,
}

impl<'a> ReceiptFormatter<'a> {
    /// Format a whole job and return its bytes.
    ///
    /// Asset problems are printed inline as `ERROR:` lines. Buffer overflow
    /// aborts the job.
    pub fn format(
        template: Template,
        fields: &'a ReceiptFields,
        driver: &'a mut dyn Driver,
        assets: &'a dyn AssetStore,
    ) -> Result<Vec<u8>, PrinterError> {
        let mut formatter = ReceiptFormatter {
            driver,
            fields,
            assets,
        };
        formatter.driver.begin_job();
        formatter.driver.init_printer()?;
        match template {
            Template::WaterBill => formatter.water_bill()?,
        }
        let bytes = formatter.driver.flush();
        debug!(%template, family = %formatter.driver.family(), bytes = bytes.len(), "formatted receipt");
        Ok(bytes)
    }

    /// Non-blank field value.
    fn field(&self, key: &str) -> Option<&'a str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn text(&mut self, text: AlignedText) -> Result<(), PrinterError> {
        self.driver.emit_aligned_text(&text)
    }

    /// `label value` on one line, omitted when the value is blank.
    fn labeled(&mut self, label: &str, key: &str) -> Result<(), PrinterError> {
        if let Some(value) = self.field(key) {
            self.text(AlignedText::new(format!("{} {}", label, value)))?;
        }
        Ok(())
    }

    /// `label ........ value VND`, omitted when the value is blank.
    fn amount(&mut self, label: &str, key: &str, emphasize: bool) -> Result<(), PrinterError> {
        let Some(value) = self.field(key) else {
            return Ok(());
        };
        let mut left = AlignedText::new(label);
        if emphasize {
            left = left.bold();
        }
        let right = AlignedText::new(format!("{} VND", value)).right().bold();
        self.driver.emit_two_column_text(&left, &right)
    }

    // ========================================================================
    // WATER BILL
    // ========================================================================

    fn water_bill(&mut self) -> Result<(), PrinterError> {
        self.driver.emit_separator_line()?;
        self.water_bill_header()?;
        self.driver.emit_separator_line()?;
        self.water_bill_customer()?;
        self.driver.emit_separator_line()?;
        self.water_bill_amounts()?;
        self.driver.emit_separator_line()?;
        self.water_bill_footer()?;
        self.payment_qr()?;
        self.driver.emit_line_feeds(TRAILING_FEED)
    }

    fn water_bill_header(&mut self) -> Result<(), PrinterError> {
        use fields::*;

        if let Some(company) = self.field(TEN_CONG_TY) {
            self.text(AlignedText::new(company).center().bold())?;
        }
        if let Some(address) = self.field(DIA_CHI_CONG_TY) {
            self.text(AlignedText::new(address).center())?;
        }
        if let Some(phone) = self.field(DIEN_THOAI) {
            self.text(AlignedText::new(format!("ĐT: {}", phone)).center())?;
        }
        self.text(AlignedText::new("GIẤY BÁO TIỀN NƯỚC").center().bold())?;
        if let Some(period) = self.field(KY) {
            self.text(AlignedText::new(format!("KỲ: {}", period)).center())?;
        }
        Ok(())
    }

    fn water_bill_customer(&mut self) -> Result<(), PrinterError> {
        use fields::*;

        self.labeled("Mã KH:", MA_KHACH_HANG)?;
        self.labeled("Tên KH:", TEN_KHACH_HANG)?;
        self.labeled("Địa chỉ:", DIA_CHI)?;

        let old = self.field(CHI_SO_CU);
        let new = self.field(CHI_SO_MOI);
        let used = self.field(TIEU_THU);
        if old.is_some() || new.is_some() || used.is_some() {
            self.driver.emit_three_column_text(
                &AlignedText::new("Chỉ số cũ"),
                &AlignedText::new("Chỉ số mới"),
                &AlignedText::new("Tiêu thụ"),
            )?;
            self.driver.emit_three_column_text(
                &AlignedText::new(old.unwrap_or("-")),
                &AlignedText::new(new.unwrap_or("-")),
                &AlignedText::new(used.map(|u| format!("{} m3", u)).unwrap_or_else(|| "-".into()))
                    .bold(),
            )?;
        }
        Ok(())
    }

    fn water_bill_amounts(&mut self) -> Result<(), PrinterError> {
        use fields::*;

        self.amount("Tiền nước:", TIEN_NUOC, false)?;
        self.amount("Thuế VAT:", THUE_VAT, false)?;
        self.amount("Phí BVMT:", PHI_BVMT, false)?;
        self.amount("Tổng cộng:", TONG_CONG, true)
    }

    fn water_bill_footer(&mut self) -> Result<(), PrinterError> {
        use fields::*;

        if let Some(note) = self.field(GHI_CHU) {
            self.text(AlignedText::new(note))?;
        }
        self.labeled("Nhân viên:", NHAN_VIEN)?;
        self.labeled("Ngày in:", NGAY_IN)?;
        self.text(AlignedText::new("Xin cảm ơn quý khách!").center())
    }

    /// Staged QR image if one is named, otherwise a code generated from the
    /// payload. Neither field: nothing.
    fn payment_qr(&mut self) -> Result<(), PrinterError> {
        if let Some(file) = self.field(fields::QR_FILE) {
            let raster = if self.assets.exists(file) {
                self.assets.load(file)
            } else {
                Err(PrinterError::AssetMissing(format!("{} not found", file)))
            };
            return self.image_or_error(raster);
        }
        if let Some(payload) = self.field(fields::NOI_DUNG_QR) {
            let head_width = self.driver.profile().head_width_dots as usize;
            let raster = TextRaster::qr_fitting(payload, head_width, QR_CELL_SIZE);
            return self.image_or_error(raster);
        }
        Ok(())
    }

    fn image_or_error(&mut self, raster: Result<TextRaster, PrinterError>) -> Result<(), PrinterError> {
        match raster {
            Ok(raster) => self.driver.emit_image(&raster, Alignment::Center),
            Err(PrinterError::AssetMissing(reason)) => {
                warn!(%reason, "payment QR unavailable");
                self.driver.emit_asset_error(&reason)
            }
            Err(e) => {
                warn!(error = %e, "payment QR unusable");
                self.driver.emit_asset_error(&e.to_string())
            }
        }
    }
}

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

/// List all available template names
pub fn list_templates() -> &'static [&'static str] {
    &["water-bill"]
}

/// Format a receipt with a named template.
pub fn format_receipt(
    template: Template,
    fields: &ReceiptFields,
    driver: &mut dyn Driver,
    assets: &dyn AssetStore,
) -> Result<Vec<u8>, PrinterError> {
    ReceiptFormatter::format(template, fields, driver, assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::printer::PrinterFamily;

    fn sample() -> ReceiptFields {
        [
            ("tenCongTy", "ABC Co"),
            ("ky", "01/2024"),
            ("tienNuoc", "150000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn format_for(family: PrinterFamily, fields: &ReceiptFields) -> Vec<u8> {
        let mut driver = family.driver(crate::buffer::DEFAULT_CAPACITY);
        format_receipt(Template::WaterBill, fields, driver.as_mut(), &NoAssets).unwrap()
    }

    #[test]
    fn test_template_lookup() {
        assert_eq!("water-bill".parse::<Template>().unwrap(), Template::WaterBill);
        assert!("menu".parse::<Template>().is_err());
        for name in list_templates() {
            assert!(name.parse::<Template>().is_ok());
        }
    }

    #[test]
    fn test_every_family_formats() {
        for family in PrinterFamily::ALL {
            let bytes = format_for(family, &sample());
            assert!(!bytes.is_empty(), "{} produced nothing", family);
        }
    }

    #[test]
    fn test_blank_optional_field_is_omitted() {
        let mut fields = sample();
        fields.insert("maKhachHang".into(), "   ".into());
        let bytes = format_for(PrinterFamily::Honeywell0188, &fields);
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("Mã KH:"));
        assert!(!text.contains("Chỉ số"));
    }

    #[test]
    fn test_missing_qr_file_prints_error_line() {
        let mut fields = sample();
        fields.insert("qrFile".into(), "qr-code.png".into());
        let bytes = format_for(PrinterFamily::HoneywellPr3, &fields);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("ERROR: qr-code.png not found"));
    }

    #[test]
    fn test_qr_payload_generates_image() {
        let mut fields = sample();
        fields.insert("noiDungQr".into(), "00020101021238570010A000000727".into());
        let bytes = format_for(PrinterFamily::WoosimWspI350, &fields);
        let gs_v_0 = [0x1D, b'v', b'0', 0];
        assert!(bytes.windows(4).any(|w| w == gs_v_0));
    }

    #[test]
    fn test_long_qr_payload_fits_head() {
        let mut fields = sample();
        fields.insert("noiDungQr".into(), "X".repeat(900));
        let bytes = format_for(PrinterFamily::WoosimWspI350, &fields);

        // GS v 0 m xL xH yL yH: width in bytes must stay within 576 dots
        let at = bytes
            .windows(3)
            .position(|w| w == [0x1D, b'v', b'0'])
            .expect("QR image emitted");
        let width_bytes = u16::from_le_bytes([bytes[at + 4], bytes[at + 5]]);
        assert!(width_bytes as usize * 8 <= 576, "QR is {} bytes wide", width_bytes);
    }

    #[test]
    fn test_unprintable_qr_payload_prints_error_line() {
        let mut fields = sample();
        // More data than any QR version holds
        fields.insert("noiDungQr".into(), "X".repeat(5000));
        let bytes = format_for(PrinterFamily::Honeywell0188, &fields);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("ERROR: Image error: QR code generation failed"));
    }

    #[test]
    fn test_overflow_aborts_job() {
        let mut driver = PrinterFamily::HoneywellPr3.driver(512);
        let err = format_receipt(Template::WaterBill, &sample(), driver.as_mut(), &NoAssets)
            .unwrap_err();
        assert!(matches!(err, PrinterError::BufferOverflow { .. }));
    }
}
