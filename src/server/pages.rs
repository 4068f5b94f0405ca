//! HTML shown to the browser after a successful sign-in

/// Delay before the success page sends the browser back to `/`.
pub const REDIRECT_DELAY_MS: u64 = 3000;

/// Success page rendered by the OAuth callback. It tells the user the desktop
/// application has been signed in and redirects to `/` after
/// [`REDIRECT_DELAY_MS`].
pub fn callback_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Authorization Successful</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            text-align: center;
            margin-top: 50px;
            background-color: #f0f0f0;
        }}
        .container {{
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
            background-color: white;
            border-radius: 8px;
            box-shadow: 0 0 10px rgba(0,0,0,0.1);
        }}
        a {{ color: #4285f4; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Authorization was successful.</h2>
        <p>You will be redirected back to the app.</p>
        <p>You can now close this window. If you are not redirected automatically,
           <a href="/">click here</a>.</p>
    </div>
    <script>
        setTimeout(function() {{
            window.location.href = '/';
        }}, {delay});
    </script>
</body>
</html>
"#,
        delay = REDIRECT_DELAY_MS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_page_redirects_home_after_delay() {
        let page = callback_page();
        assert!(page.contains("window.location.href = '/';"));
        assert!(page.contains("}, 3000);"));
        assert!(page.contains(r#"<a href="/">click here</a>"#));
    }
}
