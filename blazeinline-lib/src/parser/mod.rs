pub mod blaze_html;
