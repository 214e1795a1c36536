use crate::item::Item;

const PAGE_TITLE: &str = "Hacker News: Top Stories";

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{PAGE_TITLE}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{PAGE_TITLE}</h1>\n\
         {body}\
         </body>\n\
         </html>\n"
    )
}

pub(crate) fn render_index(items: &[Item]) -> String {
    if items.is_empty() {
        return page("<p>No stories right now.</p>\n");
    }

    let mut list = String::from("<ol>\n");
    for item in items {
        list.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            html_escape::encode_double_quoted_attribute(&item.url),
            html_escape::encode_text(&item.title),
        ));
    }
    list.push_str("</ol>\n");

    page(&list)
}

pub(crate) fn render_error(message: &str) -> String {
    page(&format!(
        "<p>Could not load the top stories: {}</p>\n",
        html_escape::encode_text(message)
    ))
}
