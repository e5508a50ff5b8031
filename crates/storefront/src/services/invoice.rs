//! Invoice PDF rendering and archiving.
//!
//! An invoice lists each order line as `"{title} - {quantity} x ${price}"`,
//! then the right-aligned total and the payment terms. Rendered bytes go to
//! two sinks: the archive directory (best effort) and the HTTP response.

use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use thiserror::Error;
use tracing::instrument;

use larder_core::{Order, OrderId, UserId};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 8.0;
const TITLE_SIZE: f32 = 26.0;
const BODY_SIZE: f32 = 12.0;
const FOOTER_SIZE: f32 = 10.0;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const MM_PER_POINT: f32 = 0.352_778;

pub const PAYMENT_TERMS: &str = "Payment is due within 15 days. Thank you for your business.";

/// Errors from invoice rendering.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// The requester does not own the order.
    #[error("forbidden")]
    Forbidden,

    #[error("failed to render invoice: {0}")]
    Render(String),
}

/// Render an order's invoice for `requester`.
///
/// Ownership is checked before any rendering happens.
///
/// # Errors
///
/// Returns `InvoiceError::Forbidden` if `requester` does not own the order and
/// `InvoiceError::Render` if the PDF cannot be produced.
#[instrument(skip(order), fields(order_id = %order.id, requester = %requester))]
pub fn render_invoice(order: &Order, requester: UserId) -> Result<Vec<u8>, InvoiceError> {
    if !order.is_owned_by(requester) {
        return Err(InvoiceError::Forbidden);
    }

    let title = format!("Invoice {}", order.id);
    let (doc, page, layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Render(e.to_string()))?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
        pages: 1,
    };

    writer.line("Invoice", TITLE_SIZE, &bold, Align::Left);
    writer.skip(0.5);
    writer.line(
        &format!("Order #{} - {}", order.id, order.created_at.format("%Y-%m-%d")),
        BODY_SIZE,
        &regular,
        Align::Left,
    );
    writer.line(
        &format!("Billed to {} <{}>", order.customer.name, order.customer.email),
        BODY_SIZE,
        &regular,
        Align::Left,
    );
    writer.rule();

    for text in invoice_lines(order) {
        writer.line(&text, BODY_SIZE, &regular, Align::Left);
    }

    writer.rule();
    writer.line(
        &format!("Total Price: {}", order.total()),
        BODY_SIZE + 2.0,
        &bold,
        Align::Right,
    );
    writer.skip(1.0);
    writer.line(PAYMENT_TERMS, FOOTER_SIZE, &regular, Align::Left);

    tracing::debug!(pages = writer.pages, "Invoice rendered");
    doc.save_to_bytes()
        .map_err(|e| InvoiceError::Render(e.to_string()))
}

/// The per-item text lines of an invoice.
#[must_use]
pub fn invoice_lines(order: &Order) -> Vec<String> {
    order
        .items
        .iter()
        .map(|item| {
            format!(
                "{} - {} x {}",
                item.product.title, item.quantity, item.product.price
            )
        })
        .collect()
}

/// File name used for an order's invoice.
#[must_use]
pub fn invoice_file_name(order_id: OrderId) -> String {
    format!("{order_id}.pdf")
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// Writes lines top to bottom, starting a new page when the current one fills.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef, align: Align) {
        if self.y < MARGIN + LINE_HEIGHT {
            self.new_page();
        }

        let x = match align {
            Align::Left => MARGIN,
            Align::Right => (PAGE_WIDTH - MARGIN - estimate_width(text, size)).max(MARGIN),
        };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= LINE_HEIGHT.max(size * MM_PER_POINT * 1.4);
    }

    fn skip(&mut self, lines: f32) {
        self.y -= LINE_HEIGHT * lines;
    }

    fn rule(&mut self) {
        self.skip(0.5);
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }
}

#[allow(clippy::cast_precision_loss)] // invoice lines are short
fn estimate_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH * MM_PER_POINT
}

/// On-disk invoice archive.
#[derive(Debug, Clone)]
pub struct InvoiceArchive {
    dir: PathBuf,
}

impl InvoiceArchive {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an order's invoice is archived at.
    #[must_use]
    pub fn path_for(&self, order_id: OrderId) -> PathBuf {
        self.dir.join(invoice_file_name(order_id))
    }

    /// Write an invoice to the archive, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory or file cannot be written.
    pub async fn store(&self, order_id: OrderId, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(order_id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use larder_core::{Email, OrderCustomer, OrderItem, Price, ProductId, ProductSnapshot};

    use super::*;

    fn item(id: i32, title: &str, dollars: i64, quantity: u32) -> OrderItem {
        OrderItem {
            quantity,
            product: ProductSnapshot {
                product_id: ProductId::new(id),
                title: title.to_string(),
                price: Price::new(Decimal::from(dollars)).unwrap(),
                description: String::new(),
                image_url: String::new(),
            },
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(42),
            customer: OrderCustomer {
                user_id: UserId::new(1),
                name: "Ada".to_string(),
                email: Email::parse("ada@example.com").unwrap(),
            },
            items,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_lines_and_total() {
        let order = order(vec![item(1, "A", 10, 2), item(2, "B", 5, 1)]);
        assert_eq!(invoice_lines(&order), vec!["A - 2 x $10.00", "B - 1 x $5.00"]);
        assert_eq!(order.total().to_string(), "$25.00");
    }

    #[test]
    fn test_render_produces_pdf() {
        let order = order(vec![item(1, "A", 10, 2), item(2, "B", 5, 1)]);
        let bytes = render_invoice(&order, UserId::new(1)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_long_order_spans_pages() {
        let items = (1..=80).map(|i| item(i, "Widget", 1, 1)).collect();
        let bytes = render_invoice(&order(items), UserId::new(1)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_rejects_non_owner() {
        let order = order(vec![item(1, "A", 10, 2)]);
        assert!(matches!(
            render_invoice(&order, UserId::new(2)),
            Err(InvoiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_archive_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = InvoiceArchive::new(dir.path().join("invoices"));

        let path = archive.store(OrderId::new(7), b"%PDF-1.3").await.unwrap();
        assert_eq!(path, dir.path().join("invoices").join("7.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.3");
    }
}
