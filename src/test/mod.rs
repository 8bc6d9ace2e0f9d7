
#[cfg(test)]
mod compile;

#[cfg(test)]
mod http;


#[cfg(test)]
mod task;

#[cfg(test)]
mod workflow;
