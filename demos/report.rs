//! Order Report Example
//!
//! Renders a plain-text order report from JSON data. Shows loops, code-only
//! lines that leave no blank lines behind, a custom helper, `to_text` and a
//! nested `view` for each line item.
//!
//! Run with: cargo run --example report

use ejs::{Compiler, HelperSet, Renderer, Value};
use serde_json::json;

const REPORT: &str = r#"Order #<%= order.id %> for <%= to_text(order.customer, "guest") %>
<% let total = 0 %>
<% for item in order.items { %>
<%= view(line, item) %>
<% total += item.qty * item.price %>
<% } %>
Total: <%= money(total) %>
<% if (order.note) { %>
Note: <%= order.note %>
<% } %>
"#;

const LINE: &str = r#"  - <%= name %> x<%= qty %> @ <%= money(price) %>"#;

fn main() {
    let data = Value::from(json!({
        "line": LINE,
        "order": {
            "id": 1042,
            "customer": null,
            "items": [
                { "name": "Notebook", "qty": 2, "price": 3.5 },
                { "name": "Pen", "qty": 10, "price": 0.8 }
            ],
            "note": "Leave at the front desk"
        }
    }));

    let helpers = HelperSet::new().with_fn("money", |_, args| {
        let amount = args.first().and_then(Value::as_float).unwrap_or(0.0);
        Ok(Value::string(format!("${:.2}", amount)))
    });

    let compiled = Compiler::new(REPORT, '<')
        .map_err(ejs::Error::from)
        .and_then(|compiler| compiler.compile());
    let template = match compiled {
        Ok(template) => template,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    match Renderer::new(template).render(&data, &helpers) {
        Ok(text) => print!("{}", text),
        Err(e) => eprintln!("Render failed: {}", e),
    }
}
