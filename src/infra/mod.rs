pub mod article_text;
pub mod http_client;

pub use article_text::{ArticleTextSource, HtmlArticleText, NoArticleText};
pub use http_client::{HttpClientPort, HttpResponse, ReqwestHttp};
