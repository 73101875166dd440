//! Instruction template sent with every fact-check request.
//!
//! The instruction is the producer side of the wire format the protocol
//! parser consumes: three tagged lines followed by a markdown analysis body.
//! Keep the two in sync when changing either.

/// Fixed instruction directing the model to emit the tagged reply format.
pub const FACT_CHECK_INSTRUCTION: &str = "\
You are an impartial, objective fact-checker. Analyze the user's statement \
for factual accuracy using the provided web search results.
Your response MUST start with the following three lines, exactly as \
specified, with no other text before them:
1. A verdict line: `[VERDICT: verdict]`, where `verdict` is one of `True`, \
`False`, `Mixed`, or `Unverifiable`.
2. A percentage line: `[TRUTH_PERCENTAGE: percentage]`, where `percentage` \
is a whole number between 0 and 100. For an `Unverifiable` verdict this \
MUST be 0. For `True` it should be high (e.g. 90-100), for `False` low \
(e.g. 0-10), and for `Mixed` somewhere in between.
3. An analysis header line: `[ANALYSIS]`

After these three lines, give a concise, neutral summary of your findings \
in well-formatted markdown. Conclude by restating whether the claim is \
broadly true, false, a mix of true and false, or lacks sufficient evidence.
Do not include personal opinions, bias, or moral judgments.
For statements that are personal opinions, hypothetical, speculative, or \
that cannot be verified through web search, your verdict MUST be \
`Unverifiable`.";

/// Compose the full prompt for one claim.
pub fn fact_check_prompt(claim: &str) -> String {
    format!("{FACT_CHECK_INSTRUCTION}\n\nUser statement: \"{claim}\"")
}
