//! HTML pages

use axum::http::StatusCode;
use harmonist_api::Quote;
use harmonist_shared::models::Identity;
use maud::{DOCTYPE, Markup, html};

fn layout(title: &str, user: Option<&Identity>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Harmonist" }
                link rel="stylesheet" href="/public/style.css";
            }
            body {
                header class="site-header" {
                    nav {
                        a href="/" { "Harmonist" }
                        a href="/help" { "Help" }
                    }
                    div class="account" {
                        @if let Some(user) = user {
                            @if let Some(photo) = &user.photo_url {
                                img class="avatar" src=(photo) alt="" referrerpolicy="no-referrer";
                            }
                            span class="user-name" { (user.display_name) }
                            a href="/logout" { "Sign out" }
                        } @else {
                            a class="sign-in" href="/auth/google" { "Sign in with Google" }
                        }
                    }
                }
                main { (content) }
                script src="/public/app.js" defer {}
            }
        }
    }
}

pub fn home_page(quote: &Quote, user: Option<&Identity>, auth_error: bool) -> Markup {
    let content = html! {
        @if auth_error {
            p class="banner error" role="alert" {
                "Sign-in failed. Please try again."
            }
        }
        figure class="quote" {
            blockquote { p { (quote.text) } }
            figcaption { cite { (quote.author) } }
        }
        section class="counter" {
            p {
                "Harmonized by "
                span id="click-count" { "…" }
                " people so far."
            }
            @if let Some(user) = user {
                p { "Welcome, " (user.short_name()) "." }
                button id="contribute" type="button" { "Add my click" }
                p id="contribute-status" class="status" aria-live="polite" {}
            } @else {
                p {
                    a href="/auth/google" { "Sign in" }
                    " to add your click."
                }
            }
        }
    };

    layout("Quote of the day", user, content)
}

pub fn help_page(count: u64, user: Option<&Identity>, contributed: Option<bool>) -> Markup {
    let content = html! {
        h1 { "Help" }
        p {
            "Every visit shows a fresh quote. If the quote service is unavailable "
            "you will see a favourite of ours instead."
        }
        h2 { "The counter" }
        p {
            "Each signed-in person can add exactly one click to the global counter. "
            "It currently stands at " strong { (count) } "."
        }
        @match contributed {
            Some(true) => {
                p { "You have already added your click. Thank you!" }
            }
            Some(false) => {
                p {
                    "You have not added your click yet. Head back to the "
                    a href="/" { "homepage" }
                    " to do so."
                }
            }
            None => {
                p { a href="/auth/google" { "Sign in with Google" } " to take part." }
            }
        }
        h2 { "Your data" }
        p {
            "We keep your Google account id, name and email so that your click "
            "is only ever counted once."
        }
    };

    layout("Help", user, content)
}

pub fn error_page(status: StatusCode, title: &str, detail: Option<&str>) -> Markup {
    let content = html! {
        h1 { (title) }
        p class="status-code" { (status.as_u16()) }
        @if let Some(detail) = detail {
            pre class="detail" { (detail) }
        }
        p { a href="/" { "Back to the homepage" } }
    };

    layout(title, None, content)
}
