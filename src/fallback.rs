use crate::context::PoemContext;

/// Composes the deterministic fallback poem served when generation is
/// unavailable. Total: always returns a non-empty stanza. A missing
/// context substitutes the generic placeholders "moment" and "season".
pub fn compose_fallback(
    time: &str,
    date: &str,
    place: &str,
    context: Option<&PoemContext>,
) -> String {
    let (moment, season) = match context {
        Some(ctx) => (ctx.time_of_day.to_string(), ctx.season.to_string()),
        None => ("moment".to_string(), "season".to_string()),
    };
    format!(
        "In the {moment} light over {place},\n\
         the {season} air holds its breath.\n\
         At {time} on {date} the world turns slowly,\n\
         and every quiet street becomes a verse."
    )
}
