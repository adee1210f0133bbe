//! Default element styles, applied beneath every author stylesheet.

pub const USER_AGENT_CSS: &str = r#"
html, body, div, section, article, aside, header, footer, nav, main,
p, blockquote, pre, ul, ol, dl, dt, dd, figure, figcaption, hr, address,
h1, h2, h3, h4, h5, h6, details, summary, form, fieldset { display: block; }
head, script, style, template, title, meta, link { display: none; }
li { display: list-item; }
table { display: table; border-collapse: separate; }
thead { display: table-header-group; }
tbody { display: table-row-group; }
tfoot { display: table-footer-group; }
tr { display: table-row; }
td, th { display: table-cell; padding: 1px; }
th { font-weight: 700; text-align: center; }
img, svg { display: inline-block; }

body { margin: 8px; }
p, dl, figure { margin: 1em 0; }
blockquote { margin: 1em 40px; }
ul, ol { margin: 1em 0; padding-left: 40px; }
ul { list-style-type: disc; }
ol { list-style-type: decimal; }
ul ul, ol ul { list-style-type: circle; }
ul ul, ul ol, ol ul, ol ol { margin: 0; }
dd { margin-left: 40px; }

h1 { font-size: 2em; margin: 0.67em 0; font-weight: 700; }
h2 { font-size: 1.5em; margin: 0.83em 0; font-weight: 700; }
h3 { font-size: 1.17em; margin: 1em 0; font-weight: 700; }
h4 { font-size: 1em; margin: 1.33em 0; font-weight: 700; }
h5 { font-size: 0.83em; margin: 1.67em 0; font-weight: 700; }
h6 { font-size: 0.67em; margin: 2.33em 0; font-weight: 700; }

b, strong { font-weight: 700; }
pre, code, kbd, samp, tt { font-family: monospace; }
pre { white-space: pre; margin: 1em 0; }
a { color: #0000ee; text-decoration: underline; }
u, ins { text-decoration: underline; }
s, strike, del { text-decoration: line-through; }
hr { margin: 0.5em 0; border: 1px inset #eeeeee; }
mark { background-color: yellow; color: black; }
sub, sup { font-size: smaller; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Stylesheet;

    #[test]
    fn test_user_agent_sheet_parses() {
        let sheet = Stylesheet::parse(USER_AGENT_CSS);
        assert!(sheet.rules.len() > 30);
        assert!(sheet.rules.iter().all(|r| !r.selectors.is_empty()));
    }
}
