//! Maps decoded requests onto [`FilterBackend`] calls and encodes replies.
//!
//! One message in, one message out. The response payload layout per
//! procedure:
//!
//! | Procedure                 | Response payload                      |
//! |---------------------------|---------------------------------------|
//! | `Matches`                 | bool                                  |
//! | `GetElemhideSelectors`    | string sequence                       |
//! | `AvailableSubscriptions`  | subscription sequence                 |
//! | `ListedSubscriptions`     | subscription sequence                 |
//! | `GetExceptionDomains`     | string sequence                       |
//! | `IsWhitelistedUrl`        | bool                                  |
//! | `GetPref`                 | bool found flag, then value if found  |
//! | `IsFirstRunActionNeeded`  | bool                                  |
//! | `GetDocumentationLink`    | UTF-16 string                         |
//! | all mutations             | empty                                 |

use tracing::debug;

use crate::error::Result;
use crate::protocol::{write_subscriptions, Request};
use crate::wire::{InputBuffer, OutputBuffer};

use super::backend::FilterBackend;

/// Decodes one request, runs it against the backend, and encodes the reply.
///
/// # Errors
///
/// Decode errors for malformed requests and backend errors both bubble up;
/// the connection loop decides whether the session survives.
pub fn handle_message(
    backend: &dyn FilterBackend,
    message: &mut InputBuffer,
) -> Result<OutputBuffer> {
    let request = Request::decode(message)?;
    debug!(procedure = %request.procedure(), "Dispatching request");

    let mut response = OutputBuffer::new();
    match request {
        Request::Matches {
            url,
            content_type,
            document_url,
        } => {
            let blocked = backend.matches(&url, content_type, &document_url)?;
            response.write_bool(blocked);
        }
        Request::GetElemhideSelectors { domain } => {
            let selectors = backend.element_hiding_selectors(&domain)?;
            response.write_strings(&selectors);
        }
        Request::AvailableSubscriptions => {
            let subscriptions = backend.available_subscriptions()?;
            write_subscriptions(&mut response, &subscriptions);
        }
        Request::ListedSubscriptions => {
            let subscriptions = backend.listed_subscriptions()?;
            write_subscriptions(&mut response, &subscriptions);
        }
        Request::SetSubscription { url } => {
            backend.set_subscription(&url)?;
        }
        Request::UpdateAllSubscriptions => {
            backend.update_all_subscriptions()?;
        }
        Request::GetExceptionDomains => {
            let domains = backend.exception_domains()?;
            response.write_strings(&domains);
        }
        Request::IsWhitelistedUrl { url } => {
            let whitelisted = backend.is_whitelisted_url(&url)?;
            response.write_bool(whitelisted);
        }
        Request::AddFilter { text } => {
            backend.add_filter(&text)?;
        }
        Request::RemoveFilter { text } => {
            backend.remove_filter(&text)?;
        }
        Request::SetPref { name, value } => {
            backend.set_pref(&name, value)?;
        }
        Request::GetPref { name } => {
            match backend.get_pref(&name)? {
                Some(value) => {
                    response.write_bool(true);
                    value.write_to(&mut response);
                }
                None => {
                    response.write_bool(false);
                }
            }
        }
        Request::CheckForUpdates { callback_token } => {
            backend.check_for_updates(callback_token)?;
        }
        Request::IsFirstRunActionNeeded => {
            let needed = backend.is_first_run_action_needed()?;
            response.write_bool(needed);
        }
        Request::GetDocumentationLink => {
            let link = backend.documentation_link()?;
            response.write_wide_str(&link);
        }
    }

    Ok(response)
}

// ============================================================================
// Tests
// ============================================================================
