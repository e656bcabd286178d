/// Sanitizes user-generated text (reviews, community posts) before storage.
///
/// Whitelist based: harmless markup such as `<b>` survives, `<script>` and
/// its body, `<iframe>` and event-handler attributes are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
