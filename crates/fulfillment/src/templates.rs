//! Email and receipt templates.
//!
//! Every function here is a pure function of its inputs; rendering has no
//! side effects and the same [`ReceiptDocument`] always produces the same
//! output.

use domain::OrderStatus;

use crate::receipt::ReceiptDocument;

/// Renders the receipt as a standalone HTML document.
pub fn receipt_html(doc: &ReceiptDocument) -> String {
    let mut rows = String::new();
    for line in &doc.lines {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&line.title),
            line.platform.as_deref().map(escape).unwrap_or_default(),
            line.quantity,
            line.unit_price,
            line.line_total,
        ));
    }

    let approval = match &doc.approval {
        Some(approval) => format!(
            "<p class=\"approval\">Approved by {} &lt;{}&gt; on {}</p>",
            escape(&approval.name),
            escape(&approval.email),
            approval.approved_at.format("%Y-%m-%d"),
        ),
        None => String::new(),
    };

    let paid = if doc.is_paid { "Paid" } else { "Payment pending" };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>GameBazaar Receipt</title></head>
<body>
<h1>GameBazaar</h1>
<h2>Order Receipt</h2>
<p>Order <strong>{order_id}</strong> &middot; {date}</p>
<p>{name} &lt;{email}&gt;</p>
<p>Payment method: <strong>{payment}</strong> ({paid})</p>
<table border="1" cellpadding="4" cellspacing="0">
<thead><tr><th>Title</th><th>Platform</th><th>Qty</th><th>Unit price</th><th>Total</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<p>Subtotal: {subtotal}<br>
Tax: {tax}<br>
Shipping: {shipping}<br>
<strong>Total: {total}</strong></p>
{approval}
<p>Thank you for shopping at GameBazaar.</p>
</body>
</html>
"#,
        order_id = escape(&doc.order_id),
        date = doc.placed_at.format("%Y-%m-%d"),
        name = escape(&doc.customer_name),
        email = escape(&doc.customer_email),
        payment = escape(&doc.payment_method_label),
        paid = paid,
        rows = rows,
        subtotal = doc.subtotal,
        tax = doc.tax,
        shipping = doc.shipping_fee,
        total = doc.total,
        approval = approval,
    )
}

/// Renders the receipt as plain text for the email's text alternative.
pub fn receipt_text(doc: &ReceiptDocument) -> String {
    let mut out = String::new();
    out.push_str("GameBazaar — Order Receipt\n");
    out.push_str(&format!("Order {} ({})\n", doc.order_id, doc.placed_at.format("%Y-%m-%d")));
    out.push_str(&format!("{} <{}>\n", doc.customer_name, doc.customer_email));
    out.push_str(&format!("Payment method: {}\n\n", doc.payment_method_label));

    for line in &doc.lines {
        out.push_str(&format!(
            "  {} x{} @ {} = {}\n",
            line.title, line.quantity, line.unit_price, line.line_total
        ));
    }

    out.push_str(&format!(
        "\nSubtotal: {}\nTax: {}\nShipping: {}\nTotal: {}\n",
        doc.subtotal, doc.tax, doc.shipping_fee, doc.total
    ));

    if let Some(approval) = &doc.approval {
        out.push_str(&format!(
            "Approved by {} on {}\n",
            approval.name,
            approval.approved_at.format("%Y-%m-%d")
        ));
    }

    out.push_str("\nThank you for shopping at GameBazaar.\n");
    out
}

/// Subject and body for the order confirmation email.
pub fn order_confirmed_email(doc: &ReceiptDocument) -> (String, String) {
    let subject = format!("Your GameBazaar order {}", short_id(&doc.order_id));
    let html = format!(
        "<p>Hi {},</p>\
         <p>Thanks for your order! We've received it and will let you know as it moves along.</p>\
         {}",
        escape(&doc.customer_name),
        receipt_html(doc),
    );
    (subject, html)
}

/// Subject and body for a status update email.
pub fn status_changed_email(doc: &ReceiptDocument, status: OrderStatus) -> (String, String) {
    let headline = match status {
        OrderStatus::Processing => "Your order is being prepared",
        OrderStatus::Approved => "Your order has been approved",
        OrderStatus::Shipped => "Your order is on its way",
        OrderStatus::Delivered => "Your order has been delivered",
        OrderStatus::Pending | OrderStatus::Cancelled => "Your order was updated",
    };

    let subject = format!("{} — order {}", headline, short_id(&doc.order_id));
    let html = format!(
        "<p>Hi {},</p><p>{}.</p>{}",
        escape(&doc.customer_name),
        headline,
        receipt_html(doc),
    );
    (subject, html)
}

/// Subject and body for the welcome email.
pub fn welcome_email(customer_name: &str) -> (String, String) {
    (
        "Welcome to GameBazaar".to_string(),
        format!(
            "<p>Hi {},</p><p>Welcome to GameBazaar — happy hunting!</p>",
            escape(customer_name)
        ),
    )
}

fn short_id(order_id: &str) -> &str {
    order_id.get(..8).unwrap_or(order_id)
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
